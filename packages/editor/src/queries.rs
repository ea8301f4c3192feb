//! Read-only questions about a document and a selection.
//!
//! Every query takes the selection as given by the host and resolves it
//! first; a missing or stale selection answers "inactive".

use crate::inline::*;
use crate::selection::{byte_index, leaf_paths, leaves_between, Point, Selection};
use xmledit_model::*;

/// Runs the selection covers, across every touched block
///
/// A caret yields the runs touching it. A range skips blocks it only grazes
/// at an edge.
pub(crate) fn selected_runs(doc: &Document, selection: &Selection) -> Vec<Run> {
    let collapsed = selection.is_collapsed();
    let mut out = Vec::new();
    for range in block_ranges(doc, selection) {
        if range.is_empty() && !collapsed {
            continue;
        }
        let Some(runs) = doc
            .get(&range.path)
            .and_then(Node::as_element)
            .and_then(|el| flatten(&el.children))
        else {
            continue;
        };
        out.extend(
            runs_in_range(&runs, range.start, range.end)
                .into_iter()
                .filter(|run| collapsed || run.len() > 0)
                .cloned(),
        );
    }
    out
}

/// True when the whole selection carries `mark`
///
/// A caret reports the flags of the leaf it sits in.
pub fn is_mark_active(doc: &Document, selection: Option<&Selection>, mark: Mark) -> bool {
    let Some(selection) = selection.and_then(|s| s.resolve(doc)) else {
        return false;
    };
    if selection.is_collapsed() {
        return doc
            .get(&selection.focus.path)
            .and_then(Node::as_text)
            .is_some_and(|leaf| leaf.marks.get(mark));
    }
    let runs = selected_runs(doc, &selection);
    !runs.is_empty() && runs.iter().all(|run| run.marks.get(mark))
}

pub fn active_marks(doc: &Document, selection: Option<&Selection>) -> Marks {
    let mut marks = Marks::default();
    for mark in Mark::ALL {
        marks.set(mark, is_mark_active(doc, selection, mark));
    }
    marks
}

/// Every element enclosing a leaf in the selection, nearest first per leaf
fn enclosing<'a>(doc: &'a Document, selection: &Selection) -> Vec<&'a Element> {
    let (start, end) = selection.ordered();
    let mut out = Vec::new();
    for leaf in leaves_between(doc, &start.path, &end.path) {
        for depth in (1..leaf.len()).rev() {
            if let Some(el) = doc.get(&leaf[..depth]).and_then(Node::as_element) {
                out.push(el);
            }
        }
    }
    out
}

fn any_enclosing(doc: &Document, selection: Option<&Selection>, test: impl Fn(&Element) -> bool) -> bool {
    selection
        .and_then(|s| s.resolve(doc))
        .is_some_and(|s| enclosing(doc, &s).into_iter().any(test))
}

/// True when any node in the selection is an element of type `tag`
pub fn is_block_active(doc: &Document, selection: Option<&Selection>, tag: Tag) -> bool {
    any_enclosing(doc, selection, |el| el.tag() == tag)
}

pub fn is_heading_active(doc: &Document, selection: Option<&Selection>, level: u8) -> bool {
    any_enclosing(doc, selection, |el| {
        matches!(&el.kind, ElementKind::Heading(h) if h.level == level)
    })
}

pub fn is_link_active(doc: &Document, selection: Option<&Selection>) -> bool {
    is_block_active(doc, selection, Tag::Link)
}

/// The top-level block holding the selection's anchor
pub fn current_element<'a>(doc: &'a Document, selection: Option<&Selection>) -> Option<&'a Element> {
    let selection = selection?.resolve(doc)?;
    doc.children.get(selection.anchor.top_level()?)?.as_element()
}

/// Every occurrence of `needle` inside a single text leaf, in document order
///
/// Matches never span leaves; an empty needle matches nothing.
pub fn find(doc: &Document, needle: &str) -> Vec<Selection> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_len = char_len(needle);
    let mut out = Vec::new();
    for path in leaf_paths(doc) {
        let Some(leaf) = doc.get(&path).and_then(Node::as_text) else {
            continue;
        };
        for (byte, _) in leaf.text.match_indices(needle) {
            let start = char_len(&leaf.text[..byte]);
            out.push(Selection::new(
                Point::new(path.clone(), start),
                Point::new(path.clone(), start + needle_len),
            ));
        }
    }
    out
}

/// Text covered by a selection within one leaf, for hosts showing matches
pub fn leaf_excerpt(doc: &Document, selection: &Selection) -> Option<String> {
    let (start, end) = selection.ordered();
    if start.path != end.path {
        return None;
    }
    let text = &doc.get(&start.path)?.as_text()?.text;
    let from = byte_index(text, start.offset);
    let to = byte_index(text, end.offset);
    Some(text[from..to].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(vec![
            Element::new(
                ElementKind::Paragraph(Paragraph::default()),
                vec![
                    Text::styled("bold ", Marks::default().with(Mark::Bold)).into(),
                    Text::styled("both", Marks::default().with(Mark::Bold).with(Mark::Italic)).into(),
                ],
            )
            .into(),
            Element::heading(2, "Title café title").into(),
        ])
    }

    #[test]
    fn test_mark_active_over_range() {
        let doc = doc();
        let sel = Selection::new(Point::new(vec![0, 0], 2), Point::new(vec![0, 1], 2));
        assert!(is_mark_active(&doc, Some(&sel), Mark::Bold));
        assert!(!is_mark_active(&doc, Some(&sel), Mark::Italic));

        let caret = Selection::caret(vec![0, 1], 1);
        let marks = active_marks(&doc, Some(&caret));
        assert!(marks.bold && marks.italic && !marks.code);
        assert!(!is_mark_active(&doc, None, Mark::Bold));
    }

    #[test]
    fn test_range_ending_at_block_start_ignores_that_block() {
        let doc = doc();
        let sel = Selection::new(Point::new(vec![0, 0], 0), Point::new(vec![1, 0], 0));
        assert!(is_mark_active(&doc, Some(&sel), Mark::Bold));
    }

    #[test]
    fn test_block_and_heading_queries() {
        let doc = doc();
        let caret = Selection::caret(vec![1, 0], 0);
        assert!(is_block_active(&doc, Some(&caret), Tag::Heading));
        assert!(is_heading_active(&doc, Some(&caret), 2));
        assert!(!is_heading_active(&doc, Some(&caret), 1));
        assert!(!is_link_active(&doc, Some(&caret)));
        assert!(current_element(&doc, Some(&caret)).is_some_and(|el| el.tag() == Tag::Heading));
        assert!(current_element(&doc, None).is_none());
    }

    #[test]
    fn test_find_uses_char_offsets() {
        let doc = doc();
        let found = find(&doc, "title");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], Selection::new(Point::new(vec![1, 0], 11), Point::new(vec![1, 0], 16)));
        assert_eq!(leaf_excerpt(&doc, &found[0]).as_deref(), Some("title"));
        assert!(find(&doc, "").is_empty());
        // matches never span leaves
        assert!(find(&doc, "bold both").is_empty());
    }
}
