use crate::escape::escape;
use crate::options::SerializeOptions;
use xmledit_model::*;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Serializer converts a document tree to its XML wire form
///
/// Output layout is fixed: a declaration line, a `<document>` root, one
/// block per line indented by depth. Attributes that hold their default
/// value are omitted. Raw-xml nodes are emitted exactly as stored.
pub struct Serializer {
    options: SerializeOptions,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializeOptions::default())
    }

    pub fn with_options(options: SerializeOptions) -> Self {
        Self { options }
    }

    /// Serialize a complete document, declaration and root included
    pub fn serialize(&self, doc: &Document) -> String {
        let mut output = String::from(XML_DECLARATION);
        output.push_str("<document>\n");
        for node in &doc.children {
            self.serialize_node(node, 1, &mut output);
        }
        output.push_str("</document>");
        output
    }

    /// Serialize the nodes alone, without declaration or root, at depth 0
    pub fn serialize_fragment(&self, nodes: &[Node]) -> String {
        let mut output = String::new();
        for node in nodes {
            self.serialize_node(node, 0, &mut output);
        }
        output
    }

    fn serialize_node(&self, node: &Node, depth: usize, output: &mut String) {
        match node {
            Node::Text(text) => self.serialize_text(text, output),
            Node::Element(element) => self.serialize_element(element, depth, output),
        }
    }

    fn serialize_children(&self, element: &Element, depth: usize, output: &mut String) {
        for child in &element.children {
            self.serialize_node(child, depth, output);
        }
    }

    fn serialize_text(&self, text: &Text, output: &mut String) {
        if text.is_empty_slot() {
            return;
        }
        // outermost first: <u><em><strong><code>text</code></strong></em></u>
        let wrappers: Vec<&str> = [Mark::Underline, Mark::Italic, Mark::Bold, Mark::Code]
            .into_iter()
            .filter(|mark| text.marks.get(*mark))
            .map(Mark::xml_tag)
            .collect();

        for tag in &wrappers {
            output.push('<');
            output.push_str(tag);
            output.push('>');
        }
        output.push_str(&escape(&text.text));
        for tag in wrappers.iter().rev() {
            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
    }

    fn serialize_element(&self, element: &Element, depth: usize, output: &mut String) {
        let indent = self.options.indent(depth);
        let child_indent = self.options.indent(depth + 1);

        match &element.kind {
            ElementKind::Paragraph(paragraph) => {
                output.push_str(&indent);
                output.push_str("<p");
                push_alignment(paragraph.alignment, output);
                output.push('>');
                self.serialize_children(element, depth + 1, output);
                output.push_str("</p>\n");
            }
            ElementKind::Heading(heading) => {
                output.push_str(&indent);
                output.push_str(&format!("<h{}", heading.level));
                push_alignment(heading.alignment, output);
                output.push('>');
                self.serialize_children(element, depth + 1, output);
                output.push_str(&format!("</h{}>\n", heading.level));
            }
            ElementKind::Image(image) => {
                let mut attrs = String::new();
                push_attr("src", &image.src, &mut attrs);
                push_attr("alt", &image.alt, &mut attrs);
                push_dimension("width", image.width, &mut attrs);
                push_dimension("height", image.height, &mut attrs);
                push_alignment(image.alignment, &mut attrs);
                self.serialize_void("image", &attrs, image.caption.as_deref(), depth, output);
            }
            ElementKind::Video(video) => {
                let mut attrs = String::new();
                push_attr("src", &video.src, &mut attrs);
                if let Some(provider) = video.provider {
                    push_attr("provider", provider.as_str(), &mut attrs);
                }
                if let Some(poster) = &video.poster {
                    push_attr("poster", poster, &mut attrs);
                }
                push_attr("controls", if video.controls { "true" } else { "false" }, &mut attrs);
                push_dimension("width", video.width, &mut attrs);
                push_dimension("height", video.height, &mut attrs);
                self.serialize_void("video", &attrs, video.caption.as_deref(), depth, output);
            }
            ElementKind::Link(link) => {
                output.push_str("<link");
                push_attr("href", &link.url, output);
                if let Some(title) = &link.title {
                    push_attr("title", title, output);
                }
                if link.target != LinkTarget::SelfFrame {
                    push_attr("target", link.target.as_str(), output);
                }
                if let Some(rel) = &link.rel {
                    push_attr("rel", rel, output);
                }
                output.push('>');
                self.serialize_children(element, depth + 1, output);
                output.push_str("</link>");
            }
            ElementKind::Table(table) => {
                output.push_str(&indent);
                output.push_str("<table>\n");
                if let Some(caption) = &table.caption {
                    output.push_str(&child_indent);
                    output.push_str("<caption>");
                    output.push_str(&escape(caption));
                    output.push_str("</caption>\n");
                }
                self.serialize_children(element, depth + 1, output);
                output.push_str(&indent);
                output.push_str("</table>\n");
            }
            ElementKind::TableRow(row) => {
                output.push_str(&indent);
                output.push_str(if row.is_header { "<tr type=\"header\">\n" } else { "<tr>\n" });
                self.serialize_children(element, depth + 1, output);
                output.push_str(&indent);
                output.push_str("</tr>\n");
            }
            ElementKind::TableCell(cell) => {
                output.push_str(&indent);
                output.push_str("<td");
                push_alignment(cell.alignment, output);
                if cell.colspan > 1 {
                    push_attr("colspan", &cell.colspan.to_string(), output);
                }
                if cell.rowspan > 1 {
                    push_attr("rowspan", &cell.rowspan.to_string(), output);
                }
                output.push('>');
                self.serialize_children(element, depth + 1, output);
                output.push_str("</td>\n");
            }
            ElementKind::Blockquote(quote) => {
                let mut attrs = String::new();
                if let Some(cite) = &quote.cite {
                    push_attr("cite", cite, &mut attrs);
                }
                self.serialize_framed("blockquote", &attrs, element, depth, output);
            }
            ElementKind::CodeBlock(code) => {
                let mut attrs = String::new();
                if let Some(language) = &code.language {
                    push_attr("language", language, &mut attrs);
                }
                self.serialize_framed("code-block", &attrs, element, depth, output);
            }
            ElementKind::List(list) => {
                let (tag, attrs) = match list.list_type {
                    ListType::Ordered => ("ol", ""),
                    ListType::Unordered => ("ul", ""),
                    ListType::Task => ("ul", " type=\"task\""),
                };
                output.push_str(&format!("{}<{}{}>\n", indent, tag, attrs));
                self.serialize_children(element, depth + 1, output);
                output.push_str(&format!("{}</{}>\n", indent, tag));
            }
            ElementKind::ListItem(item) => {
                output.push_str(&indent);
                output.push_str("<li");
                if let Some(checked) = item.checked {
                    push_attr("checked", if checked { "true" } else { "false" }, output);
                }
                output.push('>');
                self.serialize_children(element, depth + 1, output);
                output.push_str("</li>\n");
            }
            ElementKind::RawXml(raw) => {
                output.push_str(&indent);
                output.push_str(&raw.raw_xml);
                output.push('\n');
            }
        }
    }

    /// Self-closing tag, or an open/close pair around a `<caption>` child
    fn serialize_void(&self, tag: &str, attrs: &str, caption: Option<&str>, depth: usize, output: &mut String) {
        let indent = self.options.indent(depth);
        match caption {
            Some(caption) => {
                output.push_str(&format!("{}<{}{}>\n", indent, tag, attrs));
                output.push_str(&self.options.indent(depth + 1));
                output.push_str("<caption>");
                output.push_str(&escape(caption));
                output.push_str("</caption>\n");
                output.push_str(&format!("{}</{}>\n", indent, tag));
            }
            None => output.push_str(&format!("{}<{}{} />\n", indent, tag, attrs)),
        }
    }

    /// Content on its own line, one level deeper than the tags
    fn serialize_framed(&self, tag: &str, attrs: &str, element: &Element, depth: usize, output: &mut String) {
        let indent = self.options.indent(depth);
        output.push_str(&format!("{}<{}{}>\n", indent, tag, attrs));
        output.push_str(&self.options.indent(depth + 1));
        self.serialize_children(element, depth + 1, output);
        output.push('\n');
        output.push_str(&format!("{}</{}>\n", indent, tag));
    }
}

fn push_attr(name: &str, value: &str, output: &mut String) {
    output.push(' ');
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(&escape(value));
    output.push('"');
}

fn push_alignment(alignment: Alignment, output: &mut String) {
    if alignment != Alignment::Left {
        push_attr("align", alignment.as_str(), output);
    }
}

fn push_dimension(name: &str, value: Option<u32>, output: &mut String) {
    if let Some(value) = value.filter(|v| *v > 0) {
        push_attr(name, &value.to_string(), output);
    }
}

/// Serialize with default options
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Serialize nodes without the document wrapper, using default options
pub fn serialize_fragment(nodes: &[Node]) -> String {
    Serializer::new().serialize_fragment(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(children: Vec<Node>) -> Node {
        Element::new(ElementKind::Paragraph(Paragraph::default()), children).into()
    }

    #[test]
    fn test_scenario_paragraph_with_two_leaves() {
        let doc = Document::new(vec![paragraph(vec![
            Node::text("Hi "),
            Text::styled("there", Marks::default().with(Mark::Bold)).into(),
        ])]);
        assert_eq!(
            serialize(&doc),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document>\n  <p>Hi <strong>there</strong></p>\n</document>"
        );
    }

    #[test]
    fn test_marks_wrap_in_fixed_order() {
        let marks = Marks::default()
            .with(Mark::Bold)
            .with(Mark::Italic)
            .with(Mark::Underline)
            .with(Mark::Code);
        let out = serialize_fragment(&[Text::styled("x", marks).into()]);
        assert_eq!(out, "<u><em><strong><code>x</code></strong></em></u>");
    }

    #[test]
    fn test_scenario_bold_code_leaf() {
        let leaf = Text::styled("text", Marks::default().with(Mark::Bold).with(Mark::Code));
        assert_eq!(serialize_fragment(&[leaf.into()]), "<strong><code>text</code></strong>");
    }

    #[test]
    fn test_empty_plain_leaf_emits_nothing() {
        let doc = Document::blank();
        assert!(serialize(&doc).contains("  <p></p>\n"));
        let bold_empty = serialize_fragment(&[Text::styled("", Marks::default().with(Mark::Bold)).into()]);
        assert_eq!(bold_empty, "<strong></strong>");
    }

    #[test]
    fn test_image_defaults_omitted() {
        let image = Element::void(ElementKind::Image(Image {
            src: "https://example.com/a.png".into(),
            alt: "".into(),
            width: Some(0),
            height: Some(240),
            caption: None,
            alignment: Alignment::Left,
        }));
        assert_eq!(
            serialize_fragment(&[image.into()]),
            "<image src=\"https://example.com/a.png\" alt=\"\" height=\"240\" />\n"
        );
    }

    #[test]
    fn test_captioned_image_uses_open_close_pair() {
        let image = Element::void(ElementKind::Image(Image {
            src: "a.png".into(),
            alt: "A".into(),
            width: None,
            height: None,
            caption: Some("Fig <1>".into()),
            alignment: Alignment::Center,
        }));
        let doc = Document::new(vec![image.into()]);
        assert!(serialize(&doc).contains(
            "  <image src=\"a.png\" alt=\"A\" align=\"center\">\n    <caption>Fig &lt;1&gt;</caption>\n  </image>\n"
        ));
    }

    #[test]
    fn test_video_always_writes_controls() {
        let video = Element::void(ElementKind::Video(Video {
            src: "v.mp4".into(),
            provider: Some(VideoProvider::Youtube),
            poster: None,
            controls: false,
            width: Some(640),
            height: None,
            caption: None,
        }));
        assert_eq!(
            serialize_fragment(&[video.into()]),
            "<video src=\"v.mp4\" provider=\"youtube\" controls=\"false\" width=\"640\" />\n"
        );
    }

    #[test]
    fn test_link_is_inline_with_escaped_attributes() {
        let link = Element::link(
            Link {
                url: "https://example.com/?a=1&b=2".into(),
                title: None,
                target: LinkTarget::Blank,
                rel: Some("noopener noreferrer".into()),
            },
            "go",
        );
        let out = serialize_fragment(&[paragraph(vec![Node::text("see "), link.into()])]);
        assert_eq!(
            out,
            "<p>see <link href=\"https://example.com/?a=1&amp;b=2\" target=\"_blank\" rel=\"noopener noreferrer\">go</link></p>\n"
        );
    }

    #[test]
    fn test_table_layout() {
        let mut table = Element::table(2, 1, true, Some("T".into()));
        if let Some(Node::Element(row)) = table.children.get_mut(1) {
            row.children[0] = Element::new(
                ElementKind::TableCell(TableCell {
                    alignment: Alignment::Right,
                    colspan: 2,
                    rowspan: 1,
                }),
                vec![Node::text("c")],
            )
            .into();
        }
        let doc = Document::new(vec![table.into()]);
        let expected = "<document>\n  <table>\n    <caption>T</caption>\n    <tr type=\"header\">\n      <td></td>\n    </tr>\n    <tr>\n      <td align=\"right\" colspan=\"2\">c</td>\n    </tr>\n  </table>\n</document>";
        assert!(serialize(&doc).ends_with(expected));
    }

    #[test]
    fn test_framed_blocks() {
        let quote = Element::new(
            ElementKind::Blockquote(Blockquote {
                cite: Some("Ada".into()),
            }),
            vec![Node::text("q")],
        );
        let code = Element::new(
            ElementKind::CodeBlock(CodeBlock {
                language: Some("rust".into()),
            }),
            vec![Node::text("fn main() {}")],
        );
        let out = serialize(&Document::new(vec![quote.into(), code.into()]));
        assert!(out.contains("  <blockquote cite=\"Ada\">\n    q\n  </blockquote>\n"));
        assert!(out.contains("  <code-block language=\"rust\">\n    fn main() {}\n  </code-block>\n"));
    }

    #[test]
    fn test_lists() {
        let mut task = Element::list(ListType::Task, vec![Element::list_item("a")]);
        if let Some(Node::Element(item)) = task.children.get_mut(0) {
            item.kind = ElementKind::ListItem(ListItem { checked: Some(true) });
        }
        let ordered = Element::list(ListType::Ordered, vec![Element::list_item("b")]);
        let out = serialize_fragment(&[task.into(), ordered.into()]);
        assert_eq!(
            out,
            "<ul type=\"task\">\n  <li checked=\"true\">a</li>\n</ul>\n<ol>\n  <li>b</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_raw_xml_is_verbatim() {
        let raw = Element::void(ElementKind::RawXml(RawXml {
            tag_name: "figure".into(),
            attributes: Default::default(),
            raw_xml: "<figure a='1'><x/></figure>".into(),
        }));
        let out = serialize(&Document::new(vec![raw.into()]));
        assert!(out.contains("\n  <figure a='1'><x/></figure>\n"));
    }

    #[test]
    fn test_custom_indent() {
        let serializer = Serializer::with_options(SerializeOptions {
            indent: "\t".into(),
        });
        let out = serializer.serialize(&Document::new(vec![Element::list(
            ListType::Unordered,
            vec![Element::list_item("x")],
        )
        .into()]));
        assert!(out.contains("\t<ul>\n\t\t<li>x</li>\n\t</ul>\n"));
    }
}
