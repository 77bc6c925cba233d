//! Migration step abstraction
//!
//! Provides the [`MigrationStep`] trait implemented by every kind of step and
//! the [`MigrationHelper`] accessors handed to steps while they run.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use settings_tree::{parse_scalar, ConfigPath, ConfigTree};

use crate::error::StepError;

/// A single transformation applied when advancing to a version
///
/// Implement this for structural or custom document changes. Steps must be
/// safe to run against documents that lack the structure they expect:
/// missing input should be a no-op, not an error.
pub trait MigrationStep: Send + Sync + Debug {
    /// Apply the step to `tree`
    ///
    /// # Errors
    /// Returns error if the step cannot complete. The run is aborted and any
    /// changes already made by this step stay in place.
    fn apply(&self, helper: &MigrationHelper, tree: &mut ConfigTree) -> Result<(), StepError>;

    /// Describe the step for logs and reports
    fn describe(&self) -> String;
}

/// Scalar accessors bound to the running step
///
/// Paths are given as `/`-delimited strings relative to the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationHelper {
    version: u32,
}

impl MigrationHelper {
    /// Create helper for a step registered at `version`
    #[inline]
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self { version }
    }

    /// Version the running step is registered at
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Read the first value at `path`, or `default`
    ///
    /// An unparsable path string also yields `default`.
    #[must_use]
    pub fn value<T: FromStr>(&self, tree: &ConfigTree, path: &str, default: T) -> T {
        match path.parse::<ConfigPath>() {
            Ok(path) => tree.read_scalar(&path, default),
            Err(_) => default,
        }
    }

    /// Read every value of a group at `path`, skipping unparsable entries
    #[must_use]
    pub fn values<T: FromStr>(&self, tree: &ConfigTree, path: &str) -> Vec<T> {
        let Ok(path) = path.parse::<ConfigPath>() else {
            return Vec::new();
        };
        tree.resolve(&path)
            .into_iter()
            .filter_map(|id| tree.value(id).and_then(parse_scalar))
            .collect()
    }

    /// Whether anything exists at `path`
    #[must_use]
    pub fn exists(&self, tree: &ConfigTree, path: &str) -> bool {
        path.parse::<ConfigPath>()
            .map(|p| !p.is_empty() && tree.resolve_first(&p).is_some())
            .unwrap_or(false)
    }

    /// Write `value` to the first node at `path`, creating it if missing
    ///
    /// # Errors
    /// Returns error if `path` does not parse or addresses the root
    pub fn set_value<T: Display>(
        &self,
        tree: &mut ConfigTree,
        path: &str,
        value: T,
    ) -> Result<(), StepError> {
        let path: ConfigPath = path.parse()?;
        tree.write_scalar(&path, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ConfigTree {
        ConfigTree::parse(
            "<config><value>2</value><list><item>1</item><item>x</item><item>3</item></list></config>",
        )
        .unwrap()
    }

    #[test]
    fn helper_reports_version() {
        assert_eq!(MigrationHelper::new(4).version(), 4);
    }

    #[test]
    fn value_reads_with_default() {
        let helper = MigrationHelper::new(1);
        let tree = tree();
        assert_eq!(helper.value(&tree, "value", 0), 2);
        assert_eq!(helper.value(&tree, "missing", 5), 5);
        assert_eq!(helper.value(&tree, "bad//path", 6), 6);
    }

    #[test]
    fn values_reads_groups() {
        let helper = MigrationHelper::new(1);
        let numbers: Vec<i32> = helper.values(&tree(), "list/item");
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn exists_checks_structure() {
        let helper = MigrationHelper::new(1);
        let tree = tree();
        assert!(helper.exists(&tree, "list/item"));
        assert!(!helper.exists(&tree, "list/other"));
        assert!(!helper.exists(&tree, ""));
    }

    #[test]
    fn set_value_writes_and_rejects_bad_paths() {
        let helper = MigrationHelper::new(1);
        let mut tree = tree();
        helper.set_value(&mut tree, "value", 4).unwrap();
        assert_eq!(helper.value(&tree, "value", 0), 4);

        assert!(matches!(
            helper.set_value(&mut tree, "a//b", 1),
            Err(StepError::Path(_))
        ));
        assert!(matches!(
            helper.set_value(&mut tree, "", 1),
            Err(StepError::Tree(_))
        ));
    }
}
