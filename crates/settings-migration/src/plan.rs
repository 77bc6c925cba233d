//! Declarative migration plans
//!
//! A [`MigrationPlan`] describes a migration history in TOML so that tools
//! can migrate documents without compiling steps in:
//!
//! ```toml
//! target_version = 2
//!
//! [[migrations]]
//! version = 1
//! kind = "move"
//! from = "value"
//! to = "int/val"
//!
//! [[migrations]]
//! version = 2
//! kind = "default"
//! path = "network/timeout_ms"
//! value = 3000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use settings_tree::ConfigPath;

use crate::delete_key::DeleteKey;
use crate::engine::MigrationEngine;
use crate::error::{MigrationError, StepError};
use crate::lambda::LambdaStep;
use crate::move_key::MoveKey;

/// Errors raised while loading or compiling a plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Plan file could not be read
    #[error("io error on '{path}': {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Plan text is not valid TOML or has an unexpected shape
    #[error("invalid plan: {0}")]
    Toml(#[from] toml::de::Error),

    /// An entry does not describe a usable step
    #[error("invalid step for version {version}: {source}")]
    Step {
        /// Version of the offending entry
        version: u32,
        /// Underlying failure
        #[source]
        source: StepError,
    },

    /// A default value is not a scalar
    #[error("default for '{path}' at version {version} must be a scalar, got {found}")]
    InvalidValue {
        /// Version of the offending entry
        version: u32,
        /// Path the default targets
        path: String,
        /// TOML type found
        found: String,
    },

    /// Registration was rejected
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// What a plan entry does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Relocate every node at `from` to `to`
    Move {
        /// Source path
        from: String,
        /// Destination path
        to: String,
    },
    /// Remove every node at `path`
    Delete {
        /// Path to remove
        path: String,
    },
    /// Write `value` at `path` only when nothing exists there yet
    Default {
        /// Target path
        path: String,
        /// Scalar to write
        value: toml::Value,
    },
}

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Version the step is registered at
    pub version: u32,
    /// Step definition
    #[serde(flatten)]
    pub action: PlannedAction,
}

/// A migration history loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Version to migrate to; defaults to the latest planned version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<u32>,
    /// Entries, registered in file order
    #[serde(default)]
    pub migrations: Vec<PlannedStep>,
}

impl MigrationPlan {
    /// Parse a plan from TOML text
    ///
    /// # Errors
    /// Returns error on malformed TOML, unknown kinds or missing fields
    pub fn from_toml_str(text: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a plan from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let plan = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), entries = plan.migrations.len(), "loaded migration plan");
        Ok(plan)
    }

    /// Explicit target, if the plan sets one
    #[inline]
    #[must_use]
    pub fn target_version(&self) -> Option<u32> {
        self.target_version
    }

    /// Explicit target, or the highest planned version
    #[must_use]
    pub fn effective_target(&self) -> u32 {
        self.target_version.unwrap_or_else(|| {
            self.migrations
                .iter()
                .map(|m| m.version)
                .max()
                .unwrap_or(0)
        })
    }

    /// Compile the plan into an engine
    ///
    /// # Errors
    /// Returns error if an entry has a bad path, a non-scalar default or
    /// version 0
    pub fn into_engine(self) -> Result<MigrationEngine, PlanError> {
        let mut engine = MigrationEngine::new();
        for PlannedStep { version, action } in self.migrations {
            let step_error = |source| PlanError::Step { version, source };
            match action {
                PlannedAction::Move { from, to } => {
                    let step = MoveKey::new(&from, &to).map_err(step_error)?;
                    engine.register(version, step)?;
                }
                PlannedAction::Delete { path } => {
                    let step = DeleteKey::new(&path).map_err(step_error)?;
                    engine.register(version, step)?;
                }
                PlannedAction::Default { path, value } => {
                    let step = default_step(version, &path, &value)?;
                    engine.register(version, step)?;
                }
            }
        }
        Ok(engine)
    }
}

fn default_step(version: u32, path: &str, value: &toml::Value) -> Result<LambdaStep, PlanError> {
    let target: ConfigPath = path.parse().map_err(|e| PlanError::Step {
        version,
        source: StepError::Path(e),
    })?;
    if target.is_empty() {
        return Err(PlanError::Step {
            version,
            source: StepError::InvalidStep("default addresses the document root".to_string()),
        });
    }

    let text = match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        other => {
            return Err(PlanError::InvalidValue {
                version,
                path: path.to_string(),
                found: other.type_str().to_string(),
            })
        }
    };

    let label = format!("default '{target}' = '{text}'");
    Ok(LambdaStep::labeled(label, move |_, tree| {
        if tree.resolve_first(&target).is_none() {
            tree.write_scalar(&target, &text)?;
        }
        Ok(())
    }))
}
