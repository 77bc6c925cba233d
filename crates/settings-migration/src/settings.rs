//! Settings documents backed by files

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use settings_tree::{ConfigPath, ConfigTree, ParseError, TreeError};

use crate::engine::{MigrationEngine, MigrationReport, VERSION_KEY};
use crate::error::MigrationError;

/// Errors raised by [`Settings`]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Reading or writing the backing file failed
    #[error("io error on '{path}': {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Document text is malformed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Document edit failed
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Migration run failed
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),

    /// `save` called on settings that were never loaded from a file
    #[error("settings have no backing file")]
    NoFile,
}

/// A configuration document with an optional backing file
#[derive(Debug, Clone)]
pub struct Settings {
    tree: ConfigTree,
    path: Option<PathBuf>,
}

impl Settings {
    /// Wrap an in-memory tree
    #[must_use]
    pub fn new(tree: ConfigTree) -> Self {
        Self { tree, path: None }
    }

    /// Parse settings from text
    ///
    /// # Errors
    /// Returns error if the text is malformed
    pub fn from_text(text: &str) -> Result<Self, SettingsError> {
        Ok(Self::new(ConfigTree::parse(text)?))
    }

    /// Load settings from a file and remember it for [`Settings::save`]
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = ConfigTree::parse(&text)?;
        tracing::debug!(path = %path.display(), nodes = tree.len(), "loaded settings");
        Ok(Self {
            tree,
            path: Some(path.to_path_buf()),
        })
    }

    /// Write back to the file the settings were loaded from
    ///
    /// # Errors
    /// Returns [`SettingsError::NoFile`] for in-memory settings, or an I/O
    /// error if writing fails
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = self.path.as_deref().ok_or(SettingsError::NoFile)?;
        self.write_to(path)
    }

    /// Write to `path` and make it the backing file
    ///
    /// # Errors
    /// Returns error if writing fails
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), SettingsError> {
        fs::write(path, self.tree.to_text()).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Backing file, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Canonical text rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        self.tree.to_text()
    }

    /// Document version, 0 when absent
    #[must_use]
    pub fn version(&self) -> u32 {
        self.tree.read_scalar(&ConfigPath::single(VERSION_KEY), 0)
    }

    /// Overwrite the document version
    ///
    /// # Errors
    /// Returns error if the marker cannot be written
    pub fn set_version(&mut self, version: u32) -> Result<(), SettingsError> {
        self.tree
            .write_scalar(&ConfigPath::single(VERSION_KEY), version)?;
        Ok(())
    }

    /// Read the first value at `path`, or `default`
    #[must_use]
    pub fn value<T: FromStr>(&self, path: &str, default: T) -> T {
        match path.parse::<ConfigPath>() {
            Ok(path) => self.tree.read_scalar(&path, default),
            Err(_) => default,
        }
    }

    /// Write `value` at `path`, creating missing nodes
    ///
    /// # Errors
    /// Returns error if `path` does not parse or addresses the root
    pub fn set_value<T: Display>(&mut self, path: &str, value: T) -> Result<(), SettingsError> {
        let path: ConfigPath = path.parse().map_err(TreeError::from)?;
        self.tree.write_scalar(&path, value)?;
        Ok(())
    }

    /// Underlying tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Run `engine` against this document
    ///
    /// # Errors
    /// Returns error if a step fails
    pub fn migrate(
        &mut self,
        engine: &MigrationEngine,
        target: u32,
    ) -> Result<MigrationReport, SettingsError> {
        Ok(engine.migrate(&mut self.tree, target)?)
    }
}
