//! Error types for settings migrations
//!
//! Structural steps treat unresolved paths as no-ops, so most failures seen
//! here come from invalid step definitions or from custom step logic.

use settings_tree::{PathError, TreeError};

/// Errors raised while constructing or applying a single step
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Step definition cannot be applied to any document
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// A path string did not parse
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Tree mutation failed
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Custom step failure
    #[error("{0}")]
    Failed(String),
}

impl StepError {
    /// Create a custom failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors raised by registration and migration runs
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Steps must target version 1 or later
    #[error("migration version must be at least 1, got {0}")]
    InvalidVersion(u32),

    /// A step failed; remaining steps were not applied
    #[error("step '{step}' for version {version} failed: {source}")]
    StepFailed {
        /// Version the step is registered at
        version: u32,
        /// Step description
        step: String,
        /// Underlying failure
        #[source]
        source: StepError,
    },
}

impl MigrationError {
    /// Version of the failing step, if the error came from a step
    #[inline]
    #[must_use]
    pub fn failed_version(&self) -> Option<u32> {
        match self {
            Self::StepFailed { version, .. } => Some(*version),
            Self::InvalidVersion(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_display_names_step_and_version() {
        let err = MigrationError::StepFailed {
            version: 3,
            step: "move 'a' -> 'b'".to_string(),
            source: StepError::failed("boom"),
        };
        assert_eq!(err.to_string(), "step 'move 'a' -> 'b'' for version 3 failed: boom");
        assert_eq!(err.failed_version(), Some(3));
    }

    #[test]
    fn path_errors_convert() {
        let err: StepError = "a//b".parse::<settings_tree::ConfigPath>().unwrap_err().into();
        assert!(matches!(err, StepError::Path(_)));
    }
}
