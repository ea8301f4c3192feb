use serde::{Deserialize, Serialize};

/// Layout options shared by the serializer and the parser
///
/// The parser strips the framing whitespace the serializer writes around
/// blockquote and code-block content, so both sides must agree on `indent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializeOptions {
    /// One level of indentation
    pub indent: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    pub fn indent(&self, depth: usize) -> String {
        self.indent.repeat(depth)
    }
}
