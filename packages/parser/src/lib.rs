//! # xmledit parser
//!
//! Bidirectional XML codec for the document tree.
//!
//! ```text
//! XML text ──tokenizer──▶ generic tree ──parser──▶ Document
//! Document ──serializer──▶ XML text
//! ```
//!
//! The tokenizer runs logos in two modes: markup between tags, and
//! attributes inside a start tag. The generic tree keeps children in
//! document order and records each element's source span.

pub mod error;
pub mod escape;
pub mod options;
pub mod parser;
pub mod serializer;
pub mod tokenizer;
pub mod xml;

#[cfg(test)]
mod tests_roundtrip;

pub use error::{ParseError, ParseResult, Validation};
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use options::SerializeOptions;
pub use parser::{parse, validate, Parser};
pub use serializer::{serialize, serialize_fragment, Serializer, XML_DECLARATION};
pub use tokenizer::{tokenize, Markup, TagToken};
