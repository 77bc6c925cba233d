//! Structural relocation step
//!
//! Provides [`MoveKey`], which renames and/or relocates every node matching
//! a source path.

use settings_tree::{ConfigPath, ConfigTree};

use crate::error::StepError;
use crate::step::{MigrationHelper, MigrationStep};

/// Move every node at `source` to `destination`
///
/// Driven purely by path decomposition, so one step kind covers leaf
/// renames, moves into new containers, renaming a group's parent and
/// renaming the repeated child itself.
///
/// # Invariants
/// - Moved nodes keep their values and subtrees
/// - Matches keep their relative order
/// - An unresolved source leaves the document untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveKey {
    source: ConfigPath,
    destination: ConfigPath,
}

impl MoveKey {
    /// Create step from path strings
    ///
    /// # Errors
    /// Returns error if either path does not parse or is empty
    pub fn new(source: &str, destination: &str) -> Result<Self, StepError> {
        Self::from_paths(source.parse()?, destination.parse()?)
    }

    /// Create step from parsed paths
    ///
    /// # Errors
    /// Returns error if either path addresses the document root
    pub fn from_paths(source: ConfigPath, destination: ConfigPath) -> Result<Self, StepError> {
        if source.is_empty() || destination.is_empty() {
            return Err(StepError::InvalidStep(format!(
                "move '{source}' -> '{destination}' addresses the document root"
            )));
        }
        Ok(Self {
            source,
            destination,
        })
    }

    /// Source path
    #[inline]
    #[must_use]
    pub fn source(&self) -> &ConfigPath {
        &self.source
    }

    /// Destination path
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &ConfigPath {
        &self.destination
    }
}

impl MigrationStep for MoveKey {
    fn apply(&self, helper: &MigrationHelper, tree: &mut ConfigTree) -> Result<(), StepError> {
        let moved = tree.move_subtree(&self.source, &self.destination);
        tracing::trace!(
            version = helper.version(),
            source = %self.source,
            destination = %self.destination,
            moved,
            "move key applied"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("move '{}' -> '{}'", self.source, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(step: &MoveKey, text: &str) -> ConfigTree {
        let mut tree = ConfigTree::parse(text).unwrap();
        step.apply(&MigrationHelper::new(1), &mut tree).unwrap();
        tree
    }

    #[test]
    fn move_key_rejects_root_paths() {
        assert!(matches!(MoveKey::new("", "a"), Err(StepError::InvalidStep(_))));
        assert!(matches!(MoveKey::new("a", ""), Err(StepError::InvalidStep(_))));
        assert!(matches!(MoveKey::new("a b", "c"), Err(StepError::Path(_))));
    }

    #[test]
    fn move_key_describe() {
        let step = MoveKey::new("values/value", "vals/value").unwrap();
        assert_eq!(step.describe(), "move 'values/value' -> 'vals/value'");
        assert_eq!(step.source().to_string(), "values/value");
        assert_eq!(step.destination().to_string(), "vals/value");
    }

    #[test]
    fn move_key_renames_leaf() {
        let step = MoveKey::new("value", "int").unwrap();
        let tree = apply(&step, "<config><value>2</value></config>");
        assert_eq!(
            tree.to_text(),
            ConfigTree::parse("<config><int>2</int></config>").unwrap().to_text()
        );
    }

    #[test]
    fn move_key_carries_subtree() {
        let step = MoveKey::new("proxy", "network/proxy").unwrap();
        let tree = apply(
            &step,
            "<config><proxy><host>h</host><port>1</port></proxy></config>",
        );
        assert_eq!(
            tree.to_text(),
            ConfigTree::parse(
                "<config><network><proxy><host>h</host><port>1</port></proxy></network></config>"
            )
            .unwrap()
            .to_text()
        );
    }

    #[test]
    fn move_key_missing_source_is_noop() {
        let step = MoveKey::new("missing", "sub/int").unwrap();
        let text = "<config><value>2</value></config>";
        let tree = apply(&step, text);
        assert_eq!(tree.to_text(), ConfigTree::parse(text).unwrap().to_text());
    }
}
