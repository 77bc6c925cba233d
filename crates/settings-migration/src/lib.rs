//! Settings Migration
//!
//! Versioned, step-wise migration of hierarchical settings documents.
//!
//! # Core Concepts
//!
//! - [`MigrationStep`]: one transformation, registered at a version
//! - [`MoveKey`] / [`DeleteKey`]: structural steps driven by paths
//! - [`LambdaStep`]: closure for value recomputation and other custom edits
//! - [`MigrationRegistry`]: steps ordered by version, then registration
//! - [`MigrationEngine`]: applies pending steps and stamps the target version
//! - [`Settings`]: a document with an optional backing file
//! - [`MigrationPlan`]: migration history declared in TOML
//!
//! # Example
//!
//! ```rust
//! use settings_migration::{LambdaStep, MigrationEngine, MoveKey};
//! use settings_tree::ConfigTree;
//!
//! let mut engine = MigrationEngine::new();
//! engine
//!     .register(1, MoveKey::new("value", "int/val").unwrap())
//!     .unwrap()
//!     .register(
//!         2,
//!         LambdaStep::labeled("double", |helper, tree| {
//!             let v: i32 = helper.value(tree, "int/val", 0);
//!             helper.set_value(tree, "int/val", v * 2)
//!         }),
//!     )
//!     .unwrap();
//!
//! let mut tree = ConfigTree::parse("<config><value>2</value></config>").unwrap();
//! engine.migrate(&mut tree, 2).unwrap();
//!
//! assert_eq!(tree.read_scalar(&"int/val".parse().unwrap(), 0), 4);
//! assert_eq!(engine.current_version(&tree), 2);
//! ```

#![warn(unreachable_pub)]

mod delete_key;
mod engine;
mod error;
mod lambda;
mod move_key;
mod plan;
mod registry;
mod settings;
mod step;

pub use delete_key::DeleteKey;
pub use engine::{AppliedStep, MigrationEngine, MigrationOutcome, MigrationReport, VERSION_KEY};
pub use error::{MigrationError, StepError};
pub use lambda::LambdaStep;
pub use move_key::MoveKey;
pub use plan::{MigrationPlan, PlanError, PlannedAction, PlannedStep};
pub use registry::{MigrationRegistry, SharedStep};
pub use settings::{Settings, SettingsError};
pub use step::{MigrationHelper, MigrationStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
