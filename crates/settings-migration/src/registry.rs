//! Migration registry
//!
//! Provides [`MigrationRegistry`], an ordered multimap from target version
//! to the steps that advance a document to that version.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::error::MigrationError;
use crate::step::MigrationStep;

/// Shared handle to a registered step
pub type SharedStep = Arc<dyn MigrationStep>;

/// Registry of migration steps keyed by version
///
/// Versions are visited in ascending order; steps within one version keep
/// their registration order, which is part of the contract.
#[derive(Debug, Default, Clone)]
pub struct MigrationRegistry {
    steps: BTreeMap<u32, Vec<SharedStep>>,
}

impl MigrationRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Append a step to `version`
    ///
    /// # Errors
    /// Returns [`MigrationError::InvalidVersion`] for version 0, which no
    /// document could ever migrate to
    pub fn register<S>(&mut self, version: u32, step: S) -> Result<(), MigrationError>
    where
        S: MigrationStep + 'static,
    {
        self.register_shared(version, Arc::new(step))
    }

    /// Append an already shared step to `version`
    ///
    /// # Errors
    /// Returns [`MigrationError::InvalidVersion`] for version 0
    pub fn register_shared(&mut self, version: u32, step: SharedStep) -> Result<(), MigrationError> {
        if version == 0 {
            return Err(MigrationError::InvalidVersion(version));
        }
        self.steps.entry(version).or_default().push(step);
        Ok(())
    }

    /// Steps for every version in `(from_exclusive, to_inclusive]`
    ///
    /// Ordered by ascending version, then by registration order. An empty
    /// or inverted range yields nothing.
    #[must_use]
    pub fn steps_up_to(&self, from_exclusive: u32, to_inclusive: u32) -> Vec<(u32, SharedStep)> {
        if from_exclusive >= to_inclusive {
            return Vec::new();
        }
        self.steps
            .range((Bound::Excluded(from_exclusive), Bound::Included(to_inclusive)))
            .flat_map(|(&version, steps)| steps.iter().map(move |s| (version, Arc::clone(s))))
            .collect()
    }

    /// Steps registered at exactly `version`
    #[must_use]
    pub fn steps_for(&self, version: u32) -> &[SharedStep] {
        self.steps.get(&version).map(Vec::as_slice).unwrap_or_default()
    }

    /// Versions that have at least one step, ascending
    #[must_use]
    pub fn versions(&self) -> Vec<u32> {
        self.steps.keys().copied().collect()
    }

    /// Highest version with registered steps
    #[inline]
    #[must_use]
    pub fn latest_version(&self) -> Option<u32> {
        self.steps.keys().next_back().copied()
    }

    /// Total number of registered steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.values().map(Vec::len).sum()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lambda::LambdaStep;
    use crate::move_key::MoveKey;

    fn labels(steps: &[(u32, SharedStep)]) -> Vec<(u32, String)> {
        steps.iter().map(|(v, s)| (*v, s.describe())).collect()
    }

    fn named(label: &str) -> LambdaStep {
        LambdaStep::labeled(label, |_, _| Ok(()))
    }

    #[test]
    fn registry_new_empty() {
        let registry = MigrationRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.latest_version(), None);
    }

    #[test]
    fn registry_rejects_version_zero() {
        let mut registry = MigrationRegistry::new();
        let result = registry.register(0, named("zero"));
        assert!(matches!(result, Err(MigrationError::InvalidVersion(0))));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_keeps_registration_order_within_version() {
        let mut registry = MigrationRegistry::new();
        registry.register(1, named("first")).unwrap();
        registry.register(1, named("second")).unwrap();
        registry.register(1, named("third")).unwrap();

        let descriptions: Vec<_> = registry.steps_for(1).iter().map(|s| s.describe()).collect();
        assert_eq!(descriptions, vec!["first", "second", "third"]);
    }

    #[test]
    fn steps_up_to_orders_by_version_then_registration() {
        let mut registry = MigrationRegistry::new();
        registry.register(3, named("c")).unwrap();
        registry.register(1, named("a1")).unwrap();
        registry.register(2, named("b")).unwrap();
        registry.register(1, named("a2")).unwrap();

        assert_eq!(
            labels(&registry.steps_up_to(0, 3)),
            vec![
                (1, "a1".to_string()),
                (1, "a2".to_string()),
                (2, "b".to_string()),
                (3, "c".to_string()),
            ]
        );
    }

    #[test]
    fn steps_up_to_excludes_from_and_includes_to() {
        let mut registry = MigrationRegistry::new();
        for v in 1..=4 {
            registry.register(v, named(&format!("v{v}"))).unwrap();
        }
        assert_eq!(
            labels(&registry.steps_up_to(1, 3)),
            vec![(2, "v2".to_string()), (3, "v3".to_string())]
        );
    }

    #[test]
    fn steps_up_to_skips_gaps_and_empty_ranges() {
        let mut registry = MigrationRegistry::new();
        registry.register(2, named("two")).unwrap();
        registry.register(7, named("seven")).unwrap();

        assert_eq!(labels(&registry.steps_up_to(0, 10)).len(), 2);
        assert!(registry.steps_up_to(2, 6).is_empty());
        assert!(registry.steps_up_to(5, 5).is_empty());
        assert!(registry.steps_up_to(9, 3).is_empty());
    }

    #[test]
    fn registry_versions_and_len() {
        let mut registry = MigrationRegistry::new();
        registry.register(5, MoveKey::new("a", "b").unwrap()).unwrap();
        registry.register(2, MoveKey::new("c", "d").unwrap()).unwrap();
        registry.register(5, named("x")).unwrap();

        assert_eq!(registry.versions(), vec![2, 5]);
        assert_eq!(registry.latest_version(), Some(5));
        assert_eq!(registry.len(), 3);
        assert!(registry.steps_for(3).is_empty());
    }

    #[test]
    fn shared_step_can_be_registered_twice() {
        let mut registry = MigrationRegistry::new();
        let step: SharedStep = Arc::new(named("shared"));
        registry.register_shared(1, Arc::clone(&step)).unwrap();
        registry.register_shared(2, step).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
