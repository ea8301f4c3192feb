use std::ops::Range;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Mismatched closing tag at {pos}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Expected a <document> root element, found {found}")]
    MissingRoot { found: String },

    #[error("Missing required attribute '{attribute}' on <{tag}> at {pos}")]
    MissingAttribute {
        pos: usize,
        tag: String,
        attribute: String,
    },

    #[error("Invalid value \"{value}\" for attribute '{attribute}' on <{tag}> at {pos}")]
    InvalidAttribute {
        pos: usize,
        tag: String,
        attribute: String,
        value: String,
    },
}

impl ParseError {
    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn mismatched_tag(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MismatchedTag {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn missing_attribute(pos: usize, tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            pos,
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_attribute(
        pos: usize,
        tag: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            pos,
            tag: tag.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Byte range the error points at, when it has one
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ParseError::InvalidSyntax { pos, .. }
            | ParseError::MismatchedTag { pos, .. }
            | ParseError::MissingAttribute { pos, .. }
            | ParseError::InvalidAttribute { pos, .. } => Some(*pos..*pos + 1),
            ParseError::UnexpectedEof { .. } | ParseError::MissingRoot { .. } => None,
        }
    }

    fn label(&self) -> String {
        match self {
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::UnexpectedEof { expected } => format!("expected {}", expected),
            ParseError::MismatchedTag { expected, .. } => format!("expected </{}>", expected),
            ParseError::MissingRoot { .. } => "expected <document>".to_string(),
            ParseError::MissingAttribute { attribute, .. } => format!("'{}' is required here", attribute),
            ParseError::InvalidAttribute { attribute, .. } => format!("bad '{}' value", attribute),
        }
    }
}

/// Outcome of a validation-only parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn failed(error: &ParseError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error
        .span()
        .map(|span| span.start.min(source.len())..span.end.min(source.len()))
        .unwrap_or(source.len().saturating_sub(1)..source.len());

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span))
                .with_color(Color::Red)
                .with_message(error.label()),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| error.to_string()),
        Err(_) => error.to_string(),
    }
}
