//! Boundary validation of mutation requests.
//!
//! Requests mirror the host's insert dialogs. Each one is checked once,
//! here, and turned into typed model values; mutations never re-validate.

use crate::errors::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use xmledit_model::*;

const URL_PATTERN: &str = r"^(?:(?:https?|ftp)://[^\s/?#]+[^\s]*|mailto:[^\s@]+@[^\s@]+)$";
const TAG_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.\-]*$";

static URL_RE: OnceLock<Option<Regex>> = OnceLock::new();
static TAG_NAME_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn cached_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Absolute http(s)/ftp URL or a mailto address
pub fn is_valid_url(value: &str) -> bool {
    cached_match(&URL_RE, URL_PATTERN, value)
}

pub fn is_valid_tag_name(value: &str) -> bool {
    cached_match(&TAG_NAME_RE, TAG_NAME_PATTERN, value)
}

fn url(field: &'static str, value: String) -> Result<String, ValidationError> {
    if is_valid_url(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidUrl { field, value })
    }
}

/// Empty strings count as absent, as in the dialogs
fn optional_url(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => url(field, v).map(Some),
        None => Ok(None),
    }
}

fn dimension(field: &'static str, value: Option<u32>) -> Result<Option<u32>, ValidationError> {
    match value {
        Some(0) => Err(ValidationError::ZeroDimension { field }),
        other => Ok(other),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn heading_level(level: u8) -> Result<u8, ValidationError> {
    if (1..=6).contains(&level) {
        Ok(level)
    } else {
        Err(ValidationError::HeadingLevel(level))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRequest {
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
    pub alignment: Alignment,
}

impl ImageRequest {
    pub fn validate(self) -> Result<Image, ValidationError> {
        if self.alt.trim().is_empty() {
            return Err(ValidationError::MissingAlt);
        }
        Ok(Image {
            src: url("src", self.src)?,
            alt: self.alt,
            width: dimension("width", self.width)?,
            height: dimension("height", self.height)?,
            caption: non_empty(self.caption),
            alignment: self.alignment,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRequest {
    pub src: String,
    pub provider: Option<VideoProvider>,
    pub poster: Option<String>,
    pub controls: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
}

impl Default for VideoRequest {
    fn default() -> Self {
        Self {
            src: String::new(),
            provider: None,
            poster: None,
            controls: true,
            width: None,
            height: None,
            caption: None,
        }
    }
}

impl VideoRequest {
    pub fn validate(self) -> Result<Video, ValidationError> {
        Ok(Video {
            src: url("src", self.src)?,
            provider: self.provider,
            poster: optional_url("poster", self.poster)?,
            controls: self.controls,
            width: dimension("width", self.width)?,
            height: dimension("height", self.height)?,
            caption: non_empty(self.caption),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkRequest {
    pub url: String,
    /// Link text used when the selection is collapsed
    pub text: Option<String>,
    pub title: Option<String>,
    pub open_in_new_tab: bool,
}

impl LinkRequest {
    /// Returns the link (without `rel`, which the editor config supplies) and its text
    pub fn validate(self) -> Result<(Link, Option<String>), ValidationError> {
        let link = Link {
            url: url("url", self.url)?,
            title: non_empty(self.title),
            target: if self.open_in_new_tab {
                LinkTarget::Blank
            } else {
                LinkTarget::SelfFrame
            },
            rel: None,
        };
        Ok((link, self.text.filter(|t| !t.is_empty())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRequest {
    pub rows: usize,
    pub columns: usize,
    pub has_header: bool,
    pub caption: Option<String>,
}

impl TableRequest {
    pub fn validate(self) -> Result<TableRequest, ValidationError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ValidationError::EmptyTable {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(TableRequest {
            caption: non_empty(self.caption),
            ..self
        })
    }
}

/// Custom markup typed by the user, kept as a raw-xml block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawXmlRequest {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub content: String,
}

impl RawXmlRequest {
    pub fn validate(self) -> Result<RawXml, ValidationError> {
        if !is_valid_tag_name(&self.tag_name) {
            return Err(ValidationError::InvalidTagName(self.tag_name));
        }
        if is_reserved_tag_name(&self.tag_name) {
            return Err(ValidationError::ReservedTagName(self.tag_name));
        }
        if let Some(bad) = self.attributes.keys().find(|key| !is_valid_tag_name(key)) {
            return Err(ValidationError::InvalidTagName(bad.clone()));
        }

        let mut raw_xml = format!("<{}", self.tag_name);
        for (key, value) in &self.attributes {
            raw_xml.push_str(&format!(" {}=\"{}\"", key, xmledit_parser::escape::escape(value)));
        }
        if self.content.is_empty() {
            raw_xml.push_str(" />");
        } else {
            raw_xml.push_str(&format!(">{}</{}>", self.content, self.tag_name));
        }

        // Content must close inside the wrapper, leaving it the only root
        let root = xmledit_parser::xml::read(&raw_xml).map_err(|err| ValidationError::MalformedXml(err.to_string()))?;
        if root.name != self.tag_name {
            return Err(ValidationError::MalformedXml(format!(
                "expected a single <{}> element",
                self.tag_name
            )));
        }

        Ok(RawXml {
            tag_name: self.tag_name,
            attributes: self.attributes,
            raw_xml,
        })
    }
}

/// Names the model maps to typed nodes or marks, which a raw-xml block must not shadow
fn is_reserved_tag_name(name: &str) -> bool {
    Tag::from_xml_name(name).is_some() || matches!(name, "document" | "caption" | "strong" | "em" | "u" | "code")
}

/// Validate an optional blockquote citation URL
pub fn cite(value: Option<String>) -> Result<Option<String>, ValidationError> {
    optional_url("cite", value)
}
