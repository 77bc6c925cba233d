//! Paths for addressing nodes within a configuration tree
//!
//! Provides [`ConfigPath`] for `/`-delimited addressing relative to the
//! document root.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a configuration tree
///
/// A sequence of node names, relative to the root element. The root element
/// itself is never part of a path; the empty path addresses the root.
///
/// # Examples
/// - `value` → a child of the root named `value`
/// - `values/value` → every `value` under every `values`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into parent path and final segment
    ///
    /// Returns `None` for the root path.
    #[must_use]
    pub fn split_leaf(&self) -> Option<(Self, &str)> {
        let (leaf, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), leaf.as_str()))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Check whether `name` is usable as a node name
    ///
    /// Names are non-empty and consist of alphanumerics, `_`, `-` and `.`.
    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }
}

impl Display for ConfigPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for ConfigPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = s
            .split('/')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if !Self::is_valid_name(seg) {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

/// Errors related to config paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric, '_', '-' or '.')")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(path: &ConfigPath) -> Vec<&str> {
        path.iter().collect()
    }

    #[test]
    fn path_root() {
        let path = ConfigPath::root();
        assert!(path.is_empty());
        assert!(path.split_leaf().is_none());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn path_split_leaf() {
        let path: ConfigPath = "values/group/value".parse().unwrap();
        let (parent, leaf) = path.split_leaf().unwrap();
        assert_eq!(segments(&parent), vec!["values", "group"]);
        assert_eq!(leaf, "value");

        let single = ConfigPath::single("value");
        let (parent, leaf) = single.split_leaf().unwrap();
        assert!(parent.is_empty());
        assert_eq!(leaf, "value");
    }

    #[test]
    fn path_display_round_trips() {
        let path: ConfigPath = "source_groups/source_group/path".parse().unwrap();
        assert_eq!(path.to_string(), "source_groups/source_group/path");
    }

    #[test]
    fn path_from_str_empty() {
        let path: ConfigPath = "".parse().unwrap();
        assert_eq!(path, ConfigPath::root());
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<ConfigPath, _> = "a//b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment(_))));

        let trailing: Result<ConfigPath, _> = "a/".parse();
        assert!(matches!(trailing, Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn path_from_str_invalid_chars() {
        let result: Result<ConfigPath, _> = "a/b c".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));

        let result: Result<ConfigPath, _> = "a/<b>".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn path_accepts_dashes_and_dots() {
        let path: ConfigPath = "indexer/max-threads/v1.2".parse().unwrap();
        assert_eq!(segments(&path), vec!["indexer", "max-threads", "v1.2"]);
    }

    #[test]
    fn single_matches_parsed_path() {
        assert_eq!(ConfigPath::single("version"), "version".parse::<ConfigPath>().unwrap());
    }
}
