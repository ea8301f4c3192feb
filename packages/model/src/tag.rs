//! Element tags and their structural classification.
//!
//! Every component asks [`Tag`] whether an element is void or inline instead of
//! comparing tag names, so the parser, serializer, normalizer and mutations
//! always agree on the classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of element tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Paragraph,
    Heading,
    Image,
    Video,
    Link,
    Blockquote,
    CodeBlock,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    RawXml,
}

impl Tag {
    pub const ALL: [Tag; 13] = [
        Tag::Paragraph,
        Tag::Heading,
        Tag::Image,
        Tag::Video,
        Tag::Link,
        Tag::Blockquote,
        Tag::CodeBlock,
        Tag::List,
        Tag::ListItem,
        Tag::Table,
        Tag::TableRow,
        Tag::TableCell,
        Tag::RawXml,
    ];

    /// Model name of the tag (`"code-block"`, `"table-row"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Tag::Paragraph => "paragraph",
            Tag::Heading => "heading",
            Tag::Image => "image",
            Tag::Video => "video",
            Tag::Link => "link",
            Tag::Blockquote => "blockquote",
            Tag::CodeBlock => "code-block",
            Tag::List => "list",
            Tag::ListItem => "list-item",
            Tag::Table => "table",
            Tag::TableRow => "table-row",
            Tag::TableCell => "table-cell",
            Tag::RawXml => "raw-xml",
        }
    }

    /// Void elements carry a single empty text leaf and no editable content.
    pub fn is_void(self) -> bool {
        matches!(self, Tag::Image | Tag::Video | Tag::RawXml)
    }

    /// Inline elements may sit between text leaves inside a text-bearing block.
    pub fn is_inline(self) -> bool {
        matches!(self, Tag::Link)
    }

    /// Elements whose children are text leaves (and, for some, inline elements).
    pub fn holds_text(self) -> bool {
        matches!(
            self,
            Tag::Paragraph
                | Tag::Heading
                | Tag::Link
                | Tag::Blockquote
                | Tag::CodeBlock
                | Tag::ListItem
                | Tag::TableCell
        )
    }

    /// Resolve an XML element name to a tag. Unknown names map to `None`
    /// and are kept as raw-xml by the parser.
    pub fn from_xml_name(name: &str) -> Option<Tag> {
        match name {
            "p" => Some(Tag::Paragraph),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Tag::Heading),
            "image" => Some(Tag::Image),
            "video" => Some(Tag::Video),
            "link" => Some(Tag::Link),
            "blockquote" => Some(Tag::Blockquote),
            "code-block" => Some(Tag::CodeBlock),
            "ol" | "ul" => Some(Tag::List),
            "li" => Some(Tag::ListItem),
            "table" => Some(Tag::Table),
            "tr" => Some(Tag::TableRow),
            "td" => Some(Tag::TableCell),
            _ => None,
        }
    }

    pub fn spec(self) -> &'static TagSpec {
        // REGISTRY is declared in `Tag::ALL` order
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference entry describing how a tag appears on the wire
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    pub tag: Tag,
    pub xml_names: &'static [&'static str],
    pub attributes: &'static [&'static str],
    pub description: &'static str,
}

pub static REGISTRY: [TagSpec; 13] = [
    TagSpec {
        tag: Tag::Paragraph,
        xml_names: &["p"],
        attributes: &["align"],
        description: "Standard paragraph block for text content",
    },
    TagSpec {
        tag: Tag::Heading,
        xml_names: &["h1", "h2", "h3", "h4", "h5", "h6"],
        attributes: &["align"],
        description: "Heading, level taken from the tag name",
    },
    TagSpec {
        tag: Tag::Image,
        xml_names: &["image"],
        attributes: &["src", "alt", "width", "height", "align"],
        description: "Embedded image with optional <caption> child",
    },
    TagSpec {
        tag: Tag::Video,
        xml_names: &["video"],
        attributes: &["src", "provider", "poster", "controls", "width", "height"],
        description: "Embedded video with optional <caption> child",
    },
    TagSpec {
        tag: Tag::Link,
        xml_names: &["link"],
        attributes: &["href", "title", "target", "rel"],
        description: "Inline hyperlink",
    },
    TagSpec {
        tag: Tag::Blockquote,
        xml_names: &["blockquote"],
        attributes: &["cite"],
        description: "Quoted text block",
    },
    TagSpec {
        tag: Tag::CodeBlock,
        xml_names: &["code-block"],
        attributes: &["language"],
        description: "Preformatted code",
    },
    TagSpec {
        tag: Tag::List,
        xml_names: &["ol", "ul"],
        attributes: &["type"],
        description: "Ordered, unordered or task list",
    },
    TagSpec {
        tag: Tag::ListItem,
        xml_names: &["li"],
        attributes: &["checked"],
        description: "Item within a list",
    },
    TagSpec {
        tag: Tag::Table,
        xml_names: &["table"],
        attributes: &[],
        description: "Table of rows with optional <caption> child",
    },
    TagSpec {
        tag: Tag::TableRow,
        xml_names: &["tr"],
        attributes: &["type"],
        description: "Row within a table, type=\"header\" marks a header row",
    },
    TagSpec {
        tag: Tag::TableCell,
        xml_names: &["td"],
        attributes: &["align", "colspan", "rowspan"],
        description: "Cell within a table row",
    },
    TagSpec {
        tag: Tag::RawXml,
        xml_names: &[],
        attributes: &[],
        description: "Any unrecognized element, kept verbatim",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_in_tag_order() {
        for tag in Tag::ALL {
            assert_eq!(tag.spec().tag, tag);
        }
    }

    #[test]
    fn test_void_and_inline_are_disjoint() {
        for tag in Tag::ALL {
            assert!(!(tag.is_void() && tag.is_inline()), "{tag} is both void and inline");
        }
        assert!(Tag::Image.is_void());
        assert!(Tag::RawXml.is_void());
        assert!(Tag::Link.is_inline());
        assert!(!Tag::Paragraph.is_void());
    }

    #[test]
    fn test_xml_names_resolve_back() {
        for tag in Tag::ALL {
            for name in tag.spec().xml_names {
                assert_eq!(Tag::from_xml_name(name), Some(tag));
            }
        }
        assert_eq!(Tag::from_xml_name("figure"), None);
    }
}
