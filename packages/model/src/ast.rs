use crate::tag::Tag;
use crate::visitor::Visitor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root document: an ordered sequence of top-level nodes
///
/// Only elements belong at the root; stray text is repaired by the
/// normalizer, never rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

/// A single entry in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(Text),
    Element(Element),
}

/// Text leaf with independent formatting flags
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

/// Formatting flags of a text leaf. Any subset may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

/// A single formatting flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
}

/// Element node: typed attributes plus children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Tag-specific attribute bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph(Paragraph),
    Heading(Heading),
    Image(Image),
    Video(Video),
    Link(Link),
    Blockquote(Blockquote),
    CodeBlock(CodeBlock),
    List(List),
    ListItem(ListItem),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    RawXml(RawXml),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 through 6
    pub level: u8,
    #[serde(default)]
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<VideoProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default = "default_true")]
    pub controls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub target: LinkTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Blockquote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct List {
    pub list_type: ListType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListItem {
    /// `Some` marks a task item, `None` a plain one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableRow {
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCell {
    pub alignment: Alignment,
    pub colspan: u32,
    pub rowspan: u32,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            colspan: 1,
            rowspan: 1,
        }
    }
}

/// Unrecognized element preserved as an opaque fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawXml {
    pub tag_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Verbatim source of the element, emitted unchanged
    pub raw_xml: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkTarget {
    #[serde(rename = "_blank")]
    Blank,
    #[default]
    #[serde(rename = "_self")]
    SelfFrame,
    #[serde(rename = "_parent")]
    Parent,
    #[serde(rename = "_top")]
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Ordered,
    #[default]
    Unordered,
    Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    Youtube,
    Vimeo,
    Custom,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_true() -> bool {
    true
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

impl LinkTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkTarget::Blank => "_blank",
            LinkTarget::SelfFrame => "_self",
            LinkTarget::Parent => "_parent",
            LinkTarget::Top => "_top",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "_blank" => Some(LinkTarget::Blank),
            "_self" => Some(LinkTarget::SelfFrame),
            "_parent" => Some(LinkTarget::Parent),
            "_top" => Some(LinkTarget::Top),
            _ => None,
        }
    }
}

impl VideoProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoProvider::Youtube => "youtube",
            VideoProvider::Vimeo => "vimeo",
            VideoProvider::Custom => "custom",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "youtube" => Some(VideoProvider::Youtube),
            "vimeo" => Some(VideoProvider::Vimeo),
            "custom" => Some(VideoProvider::Custom),
            _ => None,
        }
    }
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Bold, Mark::Italic, Mark::Underline, Mark::Code];

    /// XML wrapper tag for this flag
    pub fn xml_tag(self) -> &'static str {
        match self {
            Mark::Bold => "strong",
            Mark::Italic => "em",
            Mark::Underline => "u",
            Mark::Code => "code",
        }
    }

    pub fn from_xml_tag(name: &str) -> Option<Self> {
        match name {
            "strong" => Some(Mark::Bold),
            "em" => Some(Mark::Italic),
            "u" => Some(Mark::Underline),
            "code" => Some(Mark::Code),
            _ => None,
        }
    }
}

impl Marks {
    pub fn get(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        match mark {
            Mark::Bold => self.bold = value,
            Mark::Italic => self.italic = value,
            Mark::Underline => self.underline = value,
            Mark::Code => self.code = value,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Canonical empty inline slot: no payload, no flags
    pub fn is_empty_slot(&self) -> bool {
        self.text.is_empty() && self.marks.is_empty()
    }
}

impl ElementKind {
    pub fn tag(&self) -> Tag {
        match self {
            ElementKind::Paragraph(_) => Tag::Paragraph,
            ElementKind::Heading(_) => Tag::Heading,
            ElementKind::Image(_) => Tag::Image,
            ElementKind::Video(_) => Tag::Video,
            ElementKind::Link(_) => Tag::Link,
            ElementKind::Blockquote(_) => Tag::Blockquote,
            ElementKind::CodeBlock(_) => Tag::CodeBlock,
            ElementKind::List(_) => Tag::List,
            ElementKind::ListItem(_) => Tag::ListItem,
            ElementKind::Table(_) => Tag::Table,
            ElementKind::TableRow(_) => Tag::TableRow,
            ElementKind::TableCell(_) => Tag::TableCell,
            ElementKind::RawXml(_) => Tag::RawXml,
        }
    }

    /// Alignment, for the kinds that carry one
    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            ElementKind::Paragraph(p) => Some(p.alignment),
            ElementKind::Heading(h) => Some(h.alignment),
            ElementKind::Image(i) => Some(i.alignment),
            ElementKind::TableCell(c) => Some(c.alignment),
            _ => None,
        }
    }
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Build a void element; its only child is the empty inline slot.
    pub fn void(kind: ElementKind) -> Self {
        Self::new(kind, vec![Node::empty_text()])
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Paragraph(Paragraph::default()),
            vec![Node::text(text)],
        )
    }

    pub fn empty_paragraph() -> Self {
        Self::paragraph("")
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Heading(Heading {
                level,
                alignment: Alignment::Left,
            }),
            vec![Node::text(text)],
        )
    }

    pub fn link(link: Link, text: impl Into<String>) -> Self {
        Self::new(ElementKind::Link(link), vec![Node::text(text)])
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Self::new(ElementKind::ListItem(ListItem::default()), vec![Node::text(text)])
    }

    pub fn list(list_type: ListType, items: Vec<Element>) -> Self {
        Self::new(
            ElementKind::List(List { list_type }),
            items.into_iter().map(Node::Element).collect(),
        )
    }

    pub fn table_cell(text: impl Into<String>) -> Self {
        Self::new(ElementKind::TableCell(TableCell::default()), vec![Node::text(text)])
    }

    pub fn table_row(is_header: bool, cells: Vec<Element>) -> Self {
        Self::new(
            ElementKind::TableRow(TableRow { is_header }),
            cells.into_iter().map(Node::Element).collect(),
        )
    }

    /// `rows × columns` table of empty cells; row 0 is a header row if requested
    pub fn table(rows: usize, columns: usize, has_header: bool, caption: Option<String>) -> Self {
        let rows = (0..rows)
            .map(|i| {
                let cells = (0..columns).map(|_| Element::table_cell("")).collect();
                Node::Element(Element::table_row(has_header && i == 0, cells))
            })
            .collect();
        Self::new(ElementKind::Table(Table { caption }), rows)
    }

    pub fn tag(&self) -> Tag {
        self.kind.tag()
    }

    pub fn is_void(&self) -> bool {
        self.tag().is_void()
    }

    pub fn is_inline(&self) -> bool {
        self.tag().is_inline()
    }

    /// Concatenated text of all descendant leaves
    pub fn string(&self) -> String {
        let mut collector = TextCollector::default();
        collector.visit_element(self);
        collector.out
    }
}

macro_rules! tag_predicates {
    ($($name:ident => $tag:ident),* $(,)?) => {
        impl Node {
            $(
                pub fn $name(&self) -> bool {
                    self.is_tag(Tag::$tag)
                }
            )*
        }
    };
}

tag_predicates! {
    is_paragraph => Paragraph,
    is_heading => Heading,
    is_image => Image,
    is_video => Video,
    is_link => Link,
    is_blockquote => Blockquote,
    is_code_block => CodeBlock,
    is_list => List,
    is_list_item => ListItem,
    is_table => Table,
    is_table_row => TableRow,
    is_table_cell => TableCell,
    is_raw_xml => RawXml,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn empty_text() -> Self {
        Node::Text(Text::default())
    }

    pub fn tag(&self) -> Option<Tag> {
        match self {
            Node::Element(el) => Some(el.tag()),
            Node::Text(_) => None,
        }
    }

    pub fn is_tag(&self, tag: Tag) -> bool {
        self.tag() == Some(tag)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_void(&self) -> bool {
        self.tag().is_some_and(Tag::is_void)
    }

    pub fn is_inline(&self) -> bool {
        match self {
            Node::Text(_) => true,
            Node::Element(el) => el.is_inline(),
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn string(&self) -> String {
        let mut collector = TextCollector::default();
        collector.visit_node(self);
        collector.out
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// New/blank document: a single empty paragraph
    pub fn blank() -> Self {
        Self::new(vec![Node::Element(Element::empty_paragraph())])
    }

    /// Resolve a path of child indices from the root sequence
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &index in rest {
            node = node.as_element()?.children.get(index)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &index in rest {
            node = node.as_element_mut()?.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Children of the node at `path`, or the root sequence for an empty path
    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.children);
        }
        self.get_mut(path)?.as_element_mut().map(|el| &mut el.children)
    }

    /// Block texts joined by newlines
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(Node::string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Default)]
struct TextCollector {
    out: String,
}

impl Visitor for TextCollector {
    fn visit_text(&mut self, text: &Text) {
        self.out.push_str(&text.text);
    }
}
