//! Removal step

use settings_tree::{ConfigPath, ConfigTree};

use crate::error::StepError;
use crate::step::{MigrationHelper, MigrationStep};

/// Remove every node at a path, with its subtree
///
/// Containers left without values or children are removed as well. A
/// missing path is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteKey {
    path: ConfigPath,
}

impl DeleteKey {
    /// Create step from a path string
    ///
    /// # Errors
    /// Returns error if the path does not parse or is empty
    pub fn new(path: &str) -> Result<Self, StepError> {
        let path: ConfigPath = path.parse()?;
        if path.is_empty() {
            return Err(StepError::InvalidStep(
                "delete addresses the document root".to_string(),
            ));
        }
        Ok(Self { path })
    }

    /// Path being removed
    #[inline]
    #[must_use]
    pub fn path(&self) -> &ConfigPath {
        &self.path
    }
}

impl MigrationStep for DeleteKey {
    fn apply(&self, helper: &MigrationHelper, tree: &mut ConfigTree) -> Result<(), StepError> {
        let removed = tree.remove_path(&self.path);
        tracing::trace!(version = helper.version(), path = %self.path, removed, "delete key applied");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("delete '{}'", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_key_removes_group_and_prunes() {
        let mut tree = ConfigTree::parse(
            "<config><cache><entry>1</entry><entry>2</entry></cache><keep>1</keep></config>",
        )
        .unwrap();
        let step = DeleteKey::new("cache/entry").unwrap();
        step.apply(&MigrationHelper::new(2), &mut tree).unwrap();
        assert_eq!(
            tree.to_text(),
            ConfigTree::parse("<config><keep>1</keep></config>").unwrap().to_text()
        );
    }

    #[test]
    fn delete_key_missing_path_is_noop() {
        let mut tree = ConfigTree::parse("<config><keep>1</keep></config>").unwrap();
        let before = tree.fingerprint();
        DeleteKey::new("gone/away")
            .unwrap()
            .apply(&MigrationHelper::new(1), &mut tree)
            .unwrap();
        assert_eq!(tree.fingerprint(), before);
    }

    #[test]
    fn delete_key_rejects_root() {
        assert!(matches!(DeleteKey::new(""), Err(StepError::InvalidStep(_))));
        assert_eq!(DeleteKey::new("a/b").unwrap().describe(), "delete 'a/b'");
    }
}
