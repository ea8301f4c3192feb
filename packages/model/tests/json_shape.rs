//! JSON persistence shape of the document tree

use serde_json::json;
use xmledit_model::*;

fn sample() -> Document {
    Document::new(vec![
        Element::new(
            ElementKind::Paragraph(Paragraph {
                alignment: Alignment::Center,
            }),
            vec![
                Node::text("Hi "),
                Text::styled("there", Marks::default().with(Mark::Bold).with(Mark::Italic)).into(),
            ],
        )
        .into(),
        Element::void(ElementKind::Video(Video {
            src: "https://example.com/v.mp4".into(),
            provider: Some(VideoProvider::Custom),
            poster: None,
            controls: true,
            width: Some(640),
            height: None,
            caption: Some("clip".into()),
        }))
        .into(),
        Element::list(ListType::Task, vec![Element::list_item("todo")]).into(),
        Element::table(1, 1, true, None).into(),
    ])
}

#[test]
fn test_json_uses_type_and_children_keys() {
    let value = serde_json::to_value(sample()).unwrap();

    assert_eq!(
        value[0],
        json!({
            "type": "paragraph",
            "alignment": "center",
            "children": [
                { "text": "Hi " },
                { "text": "there", "bold": true, "italic": true }
            ]
        })
    );
    assert_eq!(value[1]["type"], "video");
    assert_eq!(value[1]["controls"], true);
    assert_eq!(value[1]["children"], json!([{ "text": "" }]));
    assert_eq!(value[2]["listType"], "task");
    assert_eq!(value[3]["children"][0]["type"], "table-row");
    assert_eq!(value[3]["children"][0]["isHeader"], true);
}

#[test]
fn test_json_round_trip() {
    let doc = sample();
    let text = serde_json::to_string(&doc).unwrap();
    let back: Document = serde_json::from_str(&text).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_json_defaults_fill_missing_attributes() {
    let doc: Document = serde_json::from_str(
        r#"[
            {"type": "paragraph", "children": [{"text": "x"}]},
            {"type": "table-cell", "children": [{"text": ""}]},
            {"type": "link", "url": "https://example.com", "children": [{"text": "l"}]}
        ]"#,
    )
    .unwrap();

    let para = doc.children[0].as_element().unwrap();
    assert_eq!(para.kind, ElementKind::Paragraph(Paragraph::default()));

    let cell = doc.children[1].as_element().unwrap();
    assert_eq!(cell.kind, ElementKind::TableCell(TableCell::default()));

    match &doc.children[2].as_element().unwrap().kind {
        ElementKind::Link(link) => assert_eq!(link.target, LinkTarget::SelfFrame),
        other => panic!("expected link, got {other:?}"),
    }
}
