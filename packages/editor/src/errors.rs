//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] xmledit_parser::ParseError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected mutation request, raised before a mutation is constructed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Alt text is required")]
    MissingAlt,

    #[error("Invalid URL for {field}: {value:?}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroDimension { field: &'static str },

    #[error("Table needs at least one row and one column, got {rows}x{columns}")]
    EmptyTable { rows: usize, columns: usize },

    #[error("Heading level must be between 1 and 6, got {0}")]
    HeadingLevel(u8),

    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Tag name is reserved: {0:?}")]
    ReservedTagName(String),

    #[error("Malformed markup: {0}")]
    MalformedXml(String),

    #[error("Search text must not be empty")]
    EmptySearch,
}
