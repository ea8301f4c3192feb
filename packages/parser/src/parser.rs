use crate::error::{ParseError, ParseResult, Validation};
use crate::options::SerializeOptions;
use crate::xml::{self, XmlContent, XmlElement};
use tracing::{debug, info};
use xmledit_model::*;

/// Maps XML text onto the document tree
///
/// Recognised tags become typed elements; any other element is kept as
/// raw-xml holding its exact source text. Mark wrappers (`strong`, `em`,
/// `u`, `code`) accumulate onto the leaves they contain.
pub struct Parser<'src> {
    source: &'src str,
    options: SerializeOptions,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, SerializeOptions::default())
    }

    pub fn with_options(source: &'src str, options: SerializeOptions) -> Self {
        Self { source, options }
    }

    pub fn parse_document(&self) -> ParseResult<Document> {
        let root = xml::read(self.source)?;
        if root.name != "document" {
            return Err(ParseError::MissingRoot {
                found: format!("<{}>", root.name),
            });
        }

        let mut children = Vec::new();
        for content in &root.children {
            match content {
                XmlContent::Text(text) if text.trim().is_empty() => {}
                XmlContent::Text(text) => {
                    debug!("wrapping root-level text in a paragraph");
                    children.push(Element::paragraph(text.trim()).into());
                }
                XmlContent::Element(el) => children.push(self.block(el, 1)?),
            }
        }

        if children.is_empty() {
            children.push(Element::empty_paragraph().into());
        }

        info!(blocks = children.len(), "parsed document");
        Ok(Document::new(children))
    }

    fn block(&self, el: &XmlElement, depth: usize) -> ParseResult<Node> {
        let Some(tag) = Tag::from_xml_name(&el.name) else {
            return Ok(self.raw_xml(el));
        };

        let element = match tag {
            Tag::Paragraph => Element::new(
                ElementKind::Paragraph(Paragraph {
                    alignment: alignment(el)?,
                }),
                self.inline(el, Marks::default(), None)?,
            ),
            Tag::Heading => {
                // from_xml_name only accepts h1..h6
                let level = el.name[1..].parse::<u8>().unwrap_or(1);
                Element::new(
                    ElementKind::Heading(Heading {
                        level,
                        alignment: alignment(el)?,
                    }),
                    self.inline(el, Marks::default(), None)?,
                )
            }
            Tag::Image => Element::void(ElementKind::Image(Image {
                src: required(el, "src")?,
                alt: el.attr("alt").unwrap_or_default().to_string(),
                width: dimension(el, "width")?,
                height: dimension(el, "height")?,
                caption: caption(el),
                alignment: alignment(el)?,
            })),
            Tag::Video => Element::void(ElementKind::Video(Video {
                src: required(el, "src")?,
                provider: el
                    .attr("provider")
                    .map(|value| {
                        VideoProvider::from_attr(value).ok_or_else(|| invalid(el, "provider", value))
                    })
                    .transpose()?,
                poster: el.attr("poster").map(str::to_string),
                controls: el.attr("controls").map_or(true, |value| value == "true"),
                width: dimension(el, "width")?,
                height: dimension(el, "height")?,
                caption: caption(el),
            })),
            Tag::Link => return self.link(el, Marks::default()),
            Tag::Blockquote => Element::new(
                ElementKind::Blockquote(Blockquote {
                    cite: el.attr("cite").map(str::to_string),
                }),
                self.inline(el, Marks::default(), Some(depth))?,
            ),
            Tag::CodeBlock => Element::new(
                ElementKind::CodeBlock(CodeBlock {
                    language: el.attr("language").map(str::to_string),
                }),
                self.inline(el, Marks::default(), Some(depth))?,
            ),
            Tag::List => {
                let list_type = match (el.name.as_str(), el.attr("type")) {
                    ("ol", _) => ListType::Ordered,
                    (_, Some("task")) => ListType::Task,
                    _ => ListType::Unordered,
                };
                let items = el
                    .children_named("li")
                    .map(|li| self.block(li, depth + 1))
                    .collect::<ParseResult<Vec<_>>>()?;
                Element::new(ElementKind::List(List { list_type }), items)
            }
            Tag::ListItem => {
                let checked = match el.attr("checked") {
                    Some("true") => Some(true),
                    Some("false") => Some(false),
                    _ => None,
                };
                Element::new(
                    ElementKind::ListItem(ListItem { checked }),
                    self.inline(el, Marks::default(), None)?,
                )
            }
            Tag::Table => {
                let rows = el
                    .children_named("tr")
                    .map(|tr| self.block(tr, depth + 1))
                    .collect::<ParseResult<Vec<_>>>()?;
                Element::new(ElementKind::Table(Table { caption: caption(el) }), rows)
            }
            Tag::TableRow => {
                let cells = el
                    .children_named("td")
                    .map(|td| self.block(td, depth + 1))
                    .collect::<ParseResult<Vec<_>>>()?;
                Element::new(
                    ElementKind::TableRow(TableRow {
                        is_header: el.attr("type") == Some("header"),
                    }),
                    cells,
                )
            }
            Tag::TableCell => Element::new(
                ElementKind::TableCell(TableCell {
                    alignment: alignment(el)?,
                    colspan: span(el, "colspan")?,
                    rowspan: span(el, "rowspan")?,
                }),
                self.inline(el, Marks::default(), None)?,
            ),
            Tag::RawXml => return Ok(self.raw_xml(el)),
        };

        Ok(element.into())
    }

    fn link(&self, el: &XmlElement, marks: Marks) -> ParseResult<Node> {
        let target = match el.attr("target") {
            Some(value) => LinkTarget::from_attr(value).ok_or_else(|| invalid(el, "target", value))?,
            None => LinkTarget::SelfFrame,
        };
        let link = Link {
            url: required(el, "href")?,
            title: el.attr("title").map(str::to_string),
            target,
            rel: el.attr("rel").map(str::to_string),
        };
        Ok(Element::new(ElementKind::Link(link), self.inline(el, marks, None)?).into())
    }

    fn raw_xml(&self, el: &XmlElement) -> Node {
        debug!(tag = %el.name, "keeping unrecognized element as raw-xml");
        Element::void(ElementKind::RawXml(RawXml {
            tag_name: el.name.clone(),
            attributes: el.attributes.iter().cloned().collect(),
            raw_xml: self.source[el.span.clone()].to_string(),
        }))
        .into()
    }

    /// Inline content of a text-bearing element
    ///
    /// `framed_depth` is set for blockquote and code-block, whose content
    /// the serializer writes on its own indented line.
    fn inline(&self, el: &XmlElement, marks: Marks, framed_depth: Option<usize>) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        self.collect_inline(&el.children, marks, &mut nodes)?;

        if let Some(depth) = framed_depth {
            let prefix = format!("\n{}", self.options.indent(depth + 1));
            let suffix = format!("\n{}", self.options.indent(depth));
            strip_framing(&mut nodes, &prefix, &suffix);
        }

        if nodes.is_empty() {
            nodes.push(Node::empty_text());
        }
        Ok(nodes)
    }

    fn collect_inline(&self, contents: &[XmlContent], marks: Marks, out: &mut Vec<Node>) -> ParseResult<()> {
        for content in contents {
            match content {
                XmlContent::Text(text) => push_leaf(out, text, marks),
                XmlContent::Element(child) => {
                    if let Some(mark) = Mark::from_xml_tag(&child.name) {
                        let inner = marks.with(mark);
                        if child.children.is_empty() {
                            out.push(Text::styled("", inner).into());
                        } else {
                            self.collect_inline(&child.children, inner, out)?;
                        }
                    } else if child.name == "link" {
                        out.push(self.link(child, marks)?);
                    } else {
                        debug!(tag = %child.name, "flattening unknown inline element to text");
                        self.collect_inline(&child.children, marks, out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Append text, merging into the previous leaf when the marks match
fn push_leaf(out: &mut Vec<Node>, text: &str, marks: Marks) {
    if let Some(Node::Text(previous)) = out.last_mut() {
        if previous.marks == marks {
            previous.text.push_str(text);
            return;
        }
    }
    out.push(Text::styled(text, marks).into());
}

fn strip_framing(nodes: &mut Vec<Node>, prefix: &str, suffix: &str) {
    if let Some(Node::Text(first)) = nodes.first_mut() {
        if first.marks.is_empty() {
            if let Some(rest) = first.text.strip_prefix(prefix) {
                first.text = rest.to_string();
            }
        }
    }
    if let Some(Node::Text(last)) = nodes.last_mut() {
        if last.marks.is_empty() {
            if let Some(rest) = last.text.strip_suffix(suffix) {
                last.text = rest.to_string();
            }
        }
    }
    nodes.retain(|node| !matches!(node, Node::Text(text) if text.is_empty_slot()));
}

fn required(el: &XmlElement, name: &str) -> ParseResult<String> {
    el.attr(name)
        .map(str::to_string)
        .ok_or_else(|| ParseError::missing_attribute(el.span.start, &el.name, name))
}

fn invalid(el: &XmlElement, name: &str, value: &str) -> ParseError {
    ParseError::invalid_attribute(el.span.start, &el.name, name, value)
}

fn alignment(el: &XmlElement) -> ParseResult<Alignment> {
    match el.attr("align") {
        Some(value) => Alignment::from_attr(value).ok_or_else(|| invalid(el, "align", value)),
        None => Ok(Alignment::Left),
    }
}

fn dimension(el: &XmlElement, name: &str) -> ParseResult<Option<u32>> {
    el.attr(name)
        .map(|value| match value.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(el, name, value)),
        })
        .transpose()
}

fn span(el: &XmlElement, name: &str) -> ParseResult<u32> {
    Ok(dimension(el, name)?.unwrap_or(1))
}

fn caption(el: &XmlElement) -> Option<String> {
    el.children_named("caption").next().map(XmlElement::text)
}

/// Parse XML text into a document using default options
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source).parse_document()
}

/// Check whether text parses, without keeping the result
pub fn validate(source: &str) -> Validation {
    match parse(source) {
        Ok(_) => Validation::ok(),
        Err(err) => Validation::failed(&err),
    }
}
