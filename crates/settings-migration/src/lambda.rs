//! Custom migration steps
//!
//! Provides [`LambdaStep`] for changes that are not pure structural moves:
//! value recomputation, type coercion, merging with computed defaults.

use std::fmt::{self, Debug, Formatter};

use settings_tree::ConfigTree;

use crate::error::StepError;
use crate::step::{MigrationHelper, MigrationStep};

type LambdaFn = dyn Fn(&MigrationHelper, &mut ConfigTree) -> Result<(), StepError> + Send + Sync;

/// Step backed by a closure
///
/// # Example
/// ```rust
/// use settings_migration::{LambdaStep, MigrationHelper, MigrationStep};
/// use settings_tree::ConfigTree;
///
/// let double = LambdaStep::labeled("double value", |helper, tree| {
///     let value: i64 = helper.value(tree, "value", 0);
///     helper.set_value(tree, "value", value * 2)
/// });
///
/// let mut tree = ConfigTree::parse("<config><value>2</value></config>").unwrap();
/// double.apply(&MigrationHelper::new(1), &mut tree).unwrap();
/// assert_eq!(MigrationHelper::new(1).value(&tree, "value", 0), 4);
/// ```
pub struct LambdaStep {
    label: String,
    func: Box<LambdaFn>,
}

impl LambdaStep {
    /// Wrap a closure with a generic label
    #[must_use]
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&MigrationHelper, &mut ConfigTree) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self::labeled("lambda", func)
    }

    /// Wrap a closure with a label shown in logs and reports
    #[must_use]
    pub fn labeled<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&MigrationHelper, &mut ConfigTree) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Box::new(func),
        }
    }

    /// Step label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Debug for LambdaStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaStep")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl MigrationStep for LambdaStep {
    fn apply(&self, helper: &MigrationHelper, tree: &mut ConfigTree) -> Result<(), StepError> {
        (self.func)(helper, tree)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
