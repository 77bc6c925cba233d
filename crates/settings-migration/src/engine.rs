//! Migration engine
//!
//! Provides [`MigrationEngine`], which reads a document's version marker,
//! applies every registered step newer than it up to a target and stamps the
//! target version on success.

use serde::Serialize;
use settings_tree::{ConfigPath, ConfigTree, Fingerprint, TreeError};

use crate::error::MigrationError;
use crate::registry::MigrationRegistry;
use crate::step::{MigrationHelper, MigrationStep};

/// Name of the top-level node holding the document version
pub const VERSION_KEY: &str = "version";

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Document was already at or beyond the target; nothing changed
    UpToDate,
    /// Steps were applied and the target version stamped
    Migrated,
}

/// A step that ran during a migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedStep {
    /// Version the step is registered at
    pub version: u32,
    /// Step description
    pub description: String,
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    from: u32,
    to: u32,
    outcome: MigrationOutcome,
    applied: Vec<AppliedStep>,
    before: Fingerprint,
    after: Fingerprint,
}

impl MigrationReport {
    /// Version read from the document before the run
    #[inline]
    #[must_use]
    pub fn from_version(&self) -> u32 {
        self.from
    }

    /// Version of the document after the run
    #[inline]
    #[must_use]
    pub fn to_version(&self) -> u32 {
        self.to
    }

    /// Run outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> MigrationOutcome {
        self.outcome
    }

    /// Steps applied, in execution order
    #[inline]
    #[must_use]
    pub fn applied(&self) -> &[AppliedStep] {
        &self.applied
    }

    /// Whether the document was changed
    #[inline]
    #[must_use]
    pub fn is_migrated(&self) -> bool {
        self.outcome == MigrationOutcome::Migrated
    }

    /// Fingerprint of the document before the run
    #[inline]
    #[must_use]
    pub fn fingerprint_before(&self) -> Fingerprint {
        self.before
    }

    /// Fingerprint of the document after the run
    #[inline]
    #[must_use]
    pub fn fingerprint_after(&self) -> Fingerprint {
        self.after
    }
}

/// Applies registered steps to documents
///
/// Holds no per-document state, so one engine can migrate any number of
/// documents, including from several threads.
///
/// # Example
/// ```rust
/// use settings_migration::{MigrationEngine, MoveKey};
/// use settings_tree::ConfigTree;
///
/// let mut engine = MigrationEngine::new();
/// engine.register(1, MoveKey::new("value", "int").unwrap()).unwrap();
///
/// let mut tree = ConfigTree::parse("<config><value>2</value></config>").unwrap();
/// let report = engine.migrate(&mut tree, 1).unwrap();
///
/// assert!(report.is_migrated());
/// assert_eq!(engine.current_version(&tree), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MigrationEngine {
    registry: MigrationRegistry,
}

impl MigrationEngine {
    /// Create engine with an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered steps
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Register a step at `version`
    ///
    /// # Errors
    /// Returns [`MigrationError::InvalidVersion`] for version 0
    pub fn register<S>(&mut self, version: u32, step: S) -> Result<&mut Self, MigrationError>
    where
        S: MigrationStep + 'static,
    {
        self.registry.register(version, step)?;
        Ok(self)
    }

    /// Version stored in the document, 0 when absent or unreadable
    #[must_use]
    pub fn current_version(&self, tree: &ConfigTree) -> u32 {
        tree.read_scalar(&ConfigPath::single(VERSION_KEY), 0)
    }

    /// Whether `migrate` would apply anything or stamp a new version
    #[must_use]
    pub fn needs_migration(&self, tree: &ConfigTree, target: u32) -> bool {
        self.current_version(tree) < target
    }

    /// Highest version with registered steps, 0 when empty
    #[inline]
    #[must_use]
    pub fn latest_version(&self) -> u32 {
        self.registry.latest_version().unwrap_or(0)
    }

    /// Bring `tree` up to `target`
    ///
    /// Steps registered for versions in `(current, target]` run in ascending
    /// version order, registration order within a version. On success the
    /// version marker is set to `target`, even when no step was registered
    /// for it, and moved to the end of the root's children. A document
    /// already at or beyond `target` is left untouched.
    ///
    /// # Errors
    /// Returns [`MigrationError::StepFailed`] when a step fails. Remaining
    /// steps are skipped, changes made so far stay in place and the version
    /// marker is not updated.
    pub fn migrate(
        &self,
        tree: &mut ConfigTree,
        target: u32,
    ) -> Result<MigrationReport, MigrationError> {
        let from = self.current_version(tree);
        let span = tracing::info_span!("migrate", from, to = target);
        let _guard = span.enter();

        let before = tree.fingerprint();
        if from >= target {
            tracing::debug!("document up to date");
            return Ok(MigrationReport {
                from,
                to: from,
                outcome: MigrationOutcome::UpToDate,
                applied: Vec::new(),
                before,
                after: before,
            });
        }

        let mut applied = Vec::new();
        for (version, step) in self.registry.steps_up_to(from, target) {
            let description = step.describe();
            let helper = MigrationHelper::new(version);
            if let Err(source) = step.apply(&helper, tree) {
                tracing::error!(version, step = %description, error = %source, "migration step failed");
                return Err(MigrationError::StepFailed {
                    version,
                    step: description,
                    source,
                });
            }
            tracing::debug!(version, step = %description, "applied migration step");
            applied.push(AppliedStep {
                version,
                description,
            });
        }

        stamp_version(tree, target).map_err(|e| MigrationError::StepFailed {
            version: target,
            step: "stamp version".to_string(),
            source: e.into(),
        })?;

        let after = tree.fingerprint();
        tracing::info!(steps = applied.len(), fingerprint = %after.short(), "migration complete");
        Ok(MigrationReport {
            from,
            to: target,
            outcome: MigrationOutcome::Migrated,
            applied,
            before,
            after,
        })
    }
}

/// Write `version` to the marker and move the marker after its siblings
fn stamp_version(tree: &mut ConfigTree, version: u32) -> Result<(), TreeError> {
    let marker = tree.write_scalar(&ConfigPath::single(VERSION_KEY), version)?;
    let root = tree.root();
    tree.reparent(marker, root)
}
