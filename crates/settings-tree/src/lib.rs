//! Settings Tree
//!
//! Ordered, mutable configuration documents addressed by `/`-delimited paths.
//!
//! # Core Concepts
//!
//! - [`ConfigTree`]: arena of named nodes; siblings may share a name (groups)
//! - [`NodeId`]: stable handle to a node, unaffected by moves of other nodes
//! - [`ConfigPath`]: sequence of names relative to the document root
//! - [`Fingerprint`]: Blake3 digest of the canonical text rendering
//!
//! # Example
//!
//! ```rust
//! use settings_tree::{ConfigPath, ConfigTree};
//!
//! let mut tree = ConfigTree::parse("<config><value>2</value></config>").unwrap();
//! let value: ConfigPath = "value".parse().unwrap();
//! let int: ConfigPath = "sub/int".parse().unwrap();
//!
//! tree.move_subtree(&value, &int);
//! assert_eq!(tree.read_scalar(&int, 0), 2);
//! ```

#![warn(unreachable_pub)]

mod codec;
mod error;
mod fingerprint;
mod path;
mod tree;

pub use codec::{DECLARATION, MAX_DEPTH};
pub use error::{ParseError, TreeError};
pub use fingerprint::Fingerprint;
pub use path::{ConfigPath, PathError};
pub use tree::{parse_scalar, ConfigTree, Node, NodeId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
