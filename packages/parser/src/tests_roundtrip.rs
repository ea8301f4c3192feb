//! Serializer output must parse back to the same tree
use crate::*;
use xmledit_model::*;

fn bold() -> Marks {
    Marks::default().with(Mark::Bold)
}

fn sample_document() -> Document {
    let mut table = Element::table(2, 2, true, Some("Totals & sums".into()));
    if let Some(Node::Element(row)) = table.children.get_mut(1) {
        row.children[0] = Element::new(
            ElementKind::TableCell(TableCell {
                alignment: Alignment::Center,
                colspan: 2,
                rowspan: 1,
            }),
            vec![Text::styled("wide", bold()).into()],
        )
        .into();
        row.children.truncate(1);
    }

    Document::new(vec![
        Element::new(
            ElementKind::Heading(Heading {
                level: 2,
                alignment: Alignment::Center,
            }),
            vec![Node::text("Title <draft>")],
        )
        .into(),
        Element::new(
            ElementKind::Paragraph(Paragraph::default()),
            vec![
                Node::text("plain "),
                Text::styled("bold", bold()).into(),
                Text::styled(" both", bold().with(Mark::Italic)).into(),
                Node::text(" and "),
                Element::new(
                    ElementKind::Link(Link {
                        url: "https://example.com/?q=a&b".into(),
                        title: Some("It's \"here\"".into()),
                        target: LinkTarget::Blank,
                        rel: Some("noopener noreferrer".into()),
                    }),
                    vec![Text::styled("link", Marks::default().with(Mark::Underline)).into()],
                )
                .into(),
            ],
        )
        .into(),
        Element::void(ElementKind::Image(Image {
            src: "https://example.com/a.png".into(),
            alt: "An image".into(),
            width: Some(320),
            height: Some(200),
            caption: Some("Figure 1".into()),
            alignment: Alignment::Right,
        }))
        .into(),
        Element::void(ElementKind::Video(Video {
            src: "https://example.com/v.mp4".into(),
            provider: Some(VideoProvider::Custom),
            poster: Some("https://example.com/p.png".into()),
            controls: false,
            width: None,
            height: Some(480),
            caption: Some("Clip".into()),
        }))
        .into(),
        Element::new(
            ElementKind::Blockquote(Blockquote {
                cite: Some("Someone".into()),
            }),
            vec![Node::text("To be\nor not")],
        )
        .into(),
        Element::new(
            ElementKind::CodeBlock(CodeBlock {
                language: Some("rust".into()),
            }),
            vec![Node::text("fn main() {\n    let ok = a < b && c > d;\n}")],
        )
        .into(),
        Element::list(
            ListType::Ordered,
            vec![Element::list_item("one"), Element::list_item("two")],
        )
        .into(),
        Element::new(
            ElementKind::List(List {
                list_type: ListType::Task,
            }),
            vec![
                Element::new(ElementKind::ListItem(ListItem { checked: Some(true) }), vec![Node::text("done")]).into(),
                Element::new(ElementKind::ListItem(ListItem { checked: Some(false) }), vec![Node::text("todo")]).into(),
            ],
        )
        .into(),
        table.into(),
        Element::void(ElementKind::RawXml(RawXml {
            tag_name: "figure".into(),
            attributes: [("kind".to_string(), "chart".to_string())].into_iter().collect(),
            raw_xml: "<figure kind=\"chart\"><data v='1'/>  keep   spacing</figure>".into(),
        }))
        .into(),
        Element::empty_paragraph().into(),
    ])
}

#[test]
fn test_roundtrip_full_document() {
    let doc = sample_document();
    let xml = serialize(&doc);
    let reparsed = parse(&xml).unwrap_or_else(|e| panic!("failed to reparse:\n{}\n{}", xml, e));
    assert_eq!(reparsed, doc);
}

#[test]
fn test_serialized_text_is_a_fixed_point() {
    let xml = serialize(&sample_document());
    let again = serialize(&parse(&xml).unwrap());
    assert_eq!(again, xml);
}

#[test]
fn test_roundtrip_each_block_alone() {
    for block in sample_document().children {
        let doc = Document::new(vec![block]);
        let xml = serialize(&doc);
        assert_eq!(parse(&xml).unwrap(), doc, "round trip changed:\n{}", xml);
    }
}

#[test]
fn test_roundtrip_with_custom_indent() {
    let options = SerializeOptions {
        indent: "\t".into(),
    };
    let doc = sample_document();
    let xml = Serializer::with_options(options.clone()).serialize(&doc);
    let reparsed = Parser::with_options(&xml, options).parse_document().unwrap();
    assert_eq!(reparsed, doc);
}

#[test]
fn test_roundtrip_empty_framed_blocks() {
    let doc = Document::new(vec![
        Element::new(ElementKind::Blockquote(Blockquote::default()), vec![Node::empty_text()]).into(),
        Element::new(ElementKind::CodeBlock(CodeBlock::default()), vec![Node::text("\n")]).into(),
    ]);
    assert_eq!(parse(&serialize(&doc)).unwrap(), doc);
}

#[test]
fn test_styled_empty_leaf_survives() {
    let doc = Document::new(vec![Element::new(
        ElementKind::Paragraph(Paragraph::default()),
        vec![Text::styled("", bold()).into()],
    )
    .into()]);
    assert_eq!(parse(&serialize(&doc)).unwrap(), doc);
}
