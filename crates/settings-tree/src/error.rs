//! Error types for configuration trees

use crate::path::PathError;
use crate::tree::NodeId;

/// Errors raised by tree mutation and loading
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Path could not be parsed
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Document text could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Node name is not usable as a path segment
    #[error("invalid node name: '{0}'")]
    InvalidName(String),

    /// Handle refers to a removed node
    #[error("unknown node: {0:?}")]
    UnknownNode(NodeId),

    /// Scalar writes and removal never target the root element
    #[error("the document root cannot be written to or removed")]
    RootWrite,

    /// A node cannot become a descendant of itself
    #[error("cannot move {node:?} below its own descendant {parent:?}")]
    Cycle {
        /// Node being moved
        node: NodeId,
        /// Requested new parent
        parent: NodeId,
    },
}

/// Errors while reading the XML-like text form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input ended inside markup or before the root element closed
    #[error("line {line}: unexpected end of input")]
    UnexpectedEof {
        /// 1-based line number
        line: usize,
    },

    /// A character that cannot start or continue the current construct
    #[error("line {line}: unexpected character '{found}'")]
    UnexpectedChar {
        /// 1-based line number
        line: usize,
        /// Offending character
        found: char,
    },

    /// Closing tag does not match the open element
    #[error("line {line}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// 1-based line number
        line: usize,
        /// Name of the open element
        expected: String,
        /// Name in the closing tag
        found: String,
    },

    /// Element name is empty or contains unsupported characters
    #[error("line {line}: invalid element name '{name}'")]
    InvalidName {
        /// 1-based line number
        line: usize,
        /// Rejected name
        name: String,
    },

    /// No root element present
    #[error("document has no root element")]
    MissingRoot,

    /// Content after the root element closed
    #[error("line {line}: content after the root element")]
    TrailingContent {
        /// 1-based line number
        line: usize,
    },

    /// Unsupported `&...;` reference
    #[error("line {line}: unknown entity '&{entity};'")]
    UnknownEntity {
        /// 1-based line number
        line: usize,
        /// Entity body without `&` and `;`
        entity: String,
    },

    /// Elements nested deeper than the parser accepts
    #[error("line {line}: elements nested deeper than {limit} levels")]
    TooDeep {
        /// 1-based line number
        line: usize,
        /// Maximum nesting depth
        limit: usize,
    },
}
