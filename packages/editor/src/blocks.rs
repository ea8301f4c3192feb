//! Block-level formatting: toggling block types and alignment.

use crate::inline::{block_ranges, text_block_path};
use crate::mutations::{BlockFormat, MutationResult};
use crate::selection::{Point, Selection};
use std::collections::{HashMap, HashSet};
use xmledit_model::*;

/// Blocks a block toggle may convert, as root-level paths (`[i]`) or list
/// item paths (`[list, item]`). Table cells, nested content and voids are
/// never converted.
pub(crate) fn convertible_blocks(doc: &Document, selection: &Selection) -> Vec<Vec<usize>> {
    let mut out: Vec<Vec<usize>> = Vec::new();
    for range in block_ranges(doc, selection) {
        let convertible = match range.path.as_slice() {
            [_] => true,
            [list, _] => doc.children.get(*list).is_some_and(Node::is_list),
            _ => false,
        };
        if convertible && doc.get(&range.path).is_some_and(|n| !n.is_table_cell()) && !out.contains(&range.path) {
            out.push(range.path);
        }
    }
    out
}

/// Whether the block at `path` already has the shape `format` describes
pub(crate) fn block_matches(doc: &Document, path: &[usize], format: &BlockFormat) -> bool {
    let Some(el) = doc.get(path).and_then(Node::as_element) else {
        return false;
    };
    match (format, &el.kind) {
        (BlockFormat::Paragraph, ElementKind::Paragraph(_)) => true,
        (BlockFormat::Heading(level), ElementKind::Heading(h)) => h.level == *level,
        (BlockFormat::Blockquote { .. }, ElementKind::Blockquote(_)) => true,
        (BlockFormat::CodeBlock { .. }, ElementKind::CodeBlock(_)) => true,
        (BlockFormat::List(list_type), ElementKind::ListItem(_)) => {
            path.len() == 2
                && matches!(
                    doc.children.get(path[0]).and_then(Node::as_element).map(|l| &l.kind),
                    Some(ElementKind::List(List { list_type: t })) if t == list_type
                )
        }
        _ => false,
    }
}

fn converted_kind(kind: &ElementKind, format: &BlockFormat, active: bool) -> ElementKind {
    let alignment = kind.alignment().unwrap_or_default();
    if active {
        return ElementKind::Paragraph(Paragraph { alignment });
    }
    match format {
        BlockFormat::Paragraph => ElementKind::Paragraph(Paragraph { alignment }),
        BlockFormat::Heading(level) => ElementKind::Heading(Heading {
            level: *level,
            alignment,
        }),
        BlockFormat::Blockquote { cite } => ElementKind::Blockquote(Blockquote { cite: cite.clone() }),
        BlockFormat::CodeBlock { language } => ElementKind::CodeBlock(CodeBlock {
            language: language.clone(),
        }),
        BlockFormat::List(ListType::Task) => ElementKind::ListItem(ListItem {
            checked: Some(match kind {
                ElementKind::ListItem(ListItem { checked: Some(checked) }) => *checked,
                _ => false,
            }),
        }),
        BlockFormat::List(_) => ElementKind::ListItem(ListItem { checked: None }),
    }
}

/// Toggle the selected blocks into `format`, or back to paragraphs when
/// any of them already has it
///
/// Selected list items are lifted out of their list first, splitting it.
/// Converting to a list wraps each run of adjacent converted blocks in a
/// new list.
pub(crate) fn toggle_block(doc: &mut Document, selection: &Selection, format: &BlockFormat) -> MutationResult {
    let targets = convertible_blocks(doc, selection);
    if targets.is_empty() {
        return MutationResult::skipped();
    }
    let active = targets.iter().any(|path| block_matches(doc, path, format));

    let anchor_block = text_block_path(doc, &selection.anchor.path);
    let focus_block = text_block_path(doc, &selection.focus.path);

    // lift: every target becomes a root-level block
    let mut lifted: Vec<Node> = Vec::new();
    let mut lifted_index: HashMap<Vec<usize>, usize> = HashMap::new();
    for (i, node) in std::mem::take(&mut doc.children).into_iter().enumerate() {
        let items: HashSet<usize> = targets
            .iter()
            .filter(|t| t.len() == 2 && t[0] == i)
            .map(|t| t[1])
            .collect();

        let list = match node {
            Node::Element(el) if !items.is_empty() => el,
            other => {
                if targets.contains(&vec![i]) {
                    lifted_index.insert(vec![i], lifted.len());
                }
                lifted.push(other);
                continue;
            }
        };

        let mut pending: Vec<Node> = Vec::new();
        for (j, item) in list.children.into_iter().enumerate() {
            if items.contains(&j) {
                if !pending.is_empty() {
                    lifted.push(Element::new(list.kind.clone(), std::mem::take(&mut pending)).into());
                }
                lifted_index.insert(vec![i, j], lifted.len());
                lifted.push(item);
            } else {
                pending.push(item);
            }
        }
        if !pending.is_empty() {
            lifted.push(Element::new(list.kind, pending).into());
        }
    }

    for &index in lifted_index.values() {
        if let Some(Node::Element(el)) = lifted.get_mut(index) {
            el.kind = converted_kind(&el.kind, format, active);
        }
    }

    // wrap: adjacent converted items share one new list
    let wrap = match format {
        BlockFormat::List(list_type) if !active => Some(*list_type),
        _ => None,
    };
    let converted: HashSet<usize> = lifted_index.values().copied().collect();
    let mut root: Vec<Node> = Vec::new();
    let mut placed: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut open_list: Option<Element> = None;
    for (index, node) in lifted.into_iter().enumerate() {
        match wrap {
            Some(list_type) if converted.contains(&index) => {
                let list = open_list.get_or_insert_with(|| Element::list(list_type, Vec::new()));
                placed.insert(index, vec![root.len(), list.children.len()]);
                list.children.push(node);
            }
            _ => {
                if let Some(list) = open_list.take() {
                    root.push(list.into());
                }
                placed.insert(index, vec![root.len()]);
                root.push(node);
            }
        }
    }
    if let Some(list) = open_list.take() {
        root.push(list.into());
    }
    doc.children = root;

    let new_block = |old: &Option<Vec<usize>>| -> Option<Vec<usize>> {
        let index = lifted_index.get(old.as_ref()?)?;
        placed.get(index).cloned()
    };
    let mut new_blocks: Vec<Vec<usize>> = targets
        .iter()
        .filter_map(|t| lifted_index.get(t).and_then(|i| placed.get(i)).cloned())
        .collect();
    new_blocks.sort();

    let anchor = moved_point(&selection.anchor, anchor_block.as_deref(), new_block(&anchor_block));
    let focus = moved_point(&selection.focus, focus_block.as_deref(), new_block(&focus_block));
    let fallback = |first: bool| -> Option<Point> {
        let block = if first { new_blocks.first() } else { new_blocks.last() }?;
        let mut path = block.clone();
        path.push(0);
        Some(Point::new(path, 0))
    };
    let forward = selection.anchor <= selection.focus;
    let selection = match (anchor.or_else(|| fallback(forward)), focus.or_else(|| fallback(!forward))) {
        (Some(anchor), Some(focus)) => Some(Selection::new(anchor, focus)),
        _ => None,
    };
    MutationResult::applied(selection)
}

/// Re-root `point` from its old block to the block's new path
fn moved_point(point: &Point, old_block: Option<&[usize]>, new_block: Option<Vec<usize>>) -> Option<Point> {
    let old_block = old_block?;
    let mut path = new_block?;
    path.extend_from_slice(&point.path[old_block.len()..]);
    Some(Point::new(path, point.offset))
}

fn set_kind_alignment(kind: &mut ElementKind, alignment: Alignment) -> bool {
    let slot = match kind {
        ElementKind::Paragraph(p) => &mut p.alignment,
        ElementKind::Heading(h) => &mut h.alignment,
        ElementKind::Image(i) => &mut i.alignment,
        ElementKind::TableCell(c) => &mut c.alignment,
        _ => return false,
    };
    if *slot == alignment {
        return false;
    }
    *slot = alignment;
    true
}

/// Align every selected block that carries an alignment
///
/// A caret inside an image's slot aligns the image itself.
pub(crate) fn set_alignment(doc: &mut Document, selection: &Selection, alignment: Alignment) -> MutationResult {
    let mut paths: Vec<Vec<usize>> = block_ranges(doc, selection).into_iter().map(|r| r.path).collect();
    for point in [&selection.anchor, &selection.focus] {
        if let Some((_, parent)) = point.path.split_last() {
            if doc.get(parent).is_some_and(Node::is_image) && !paths.iter().any(|p| p == parent) {
                paths.push(parent.to_vec());
            }
        }
    }

    let mut changed = false;
    for path in &paths {
        if let Some(Node::Element(el)) = doc.get_mut(path) {
            changed |= set_kind_alignment(&mut el.kind, alignment);
        }
    }
    if changed {
        MutationResult::applied(Some(selection.clone()))
    } else {
        MutationResult::skipped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_paragraphs() -> Document {
        Document::new(vec![
            Element::paragraph("one").into(),
            Element::paragraph("two").into(),
            Element::paragraph("three").into(),
        ])
    }

    fn across(from: usize, to: usize) -> Selection {
        Selection::new(Point::new(vec![from, 0], 0), Point::new(vec![to, 0], 1))
    }

    #[test]
    fn test_heading_toggle_round_trip() {
        let mut doc = three_paragraphs();
        let sel = Selection::caret(vec![1, 0], 1);
        toggle_block(&mut doc, &sel, &BlockFormat::Heading(2));
        assert!(doc.children[1].is_heading());

        // another level converts, the same level reverts
        toggle_block(&mut doc, &sel, &BlockFormat::Heading(3));
        assert!(matches!(
            doc.children[1].as_element().map(|e| &e.kind),
            Some(ElementKind::Heading(Heading { level: 3, .. }))
        ));
        toggle_block(&mut doc, &sel, &BlockFormat::Heading(3));
        assert!(doc.children[1].is_paragraph());
    }

    #[test]
    fn test_list_toggle_wraps_adjacent_blocks() {
        let mut doc = three_paragraphs();
        let result = toggle_block(&mut doc, &across(0, 1), &BlockFormat::List(ListType::Ordered));

        assert_eq!(doc.children.len(), 2);
        let list = doc.children[0].as_element().unwrap();
        assert_eq!(list.kind, ElementKind::List(List { list_type: ListType::Ordered }));
        assert_eq!(list.children.len(), 2);
        assert!(list.children.iter().all(Node::is_list_item));
        assert!(doc.children[1].is_paragraph());

        let sel = result.selection.unwrap();
        assert_eq!(sel.anchor, Point::new(vec![0, 0, 0], 0));
        assert_eq!(sel.focus, Point::new(vec![0, 1, 0], 1));
    }

    #[test]
    fn test_list_toggle_off_splits_list() {
        let mut doc = Document::new(vec![Element::list(
            ListType::Unordered,
            vec![Element::list_item("a"), Element::list_item("b"), Element::list_item("c")],
        )
        .into()]);
        let result = toggle_block(
            &mut doc,
            &Selection::caret(vec![0, 1, 0], 0),
            &BlockFormat::List(ListType::Unordered),
        );

        assert_eq!(doc.children.len(), 3);
        assert!(doc.children[0].is_list());
        assert!(doc.children[1].is_paragraph());
        assert!(doc.children[2].is_list());
        assert_eq!(doc.children[1].string(), "b");
        assert_eq!(result.selection, Some(Selection::caret(vec![1, 0], 0)));
    }

    #[test]
    fn test_list_type_switch_moves_items() {
        let mut doc = Document::new(vec![Element::list(
            ListType::Unordered,
            vec![Element::list_item("a"), Element::list_item("b")],
        )
        .into()]);
        let sel = Selection::new(Point::new(vec![0, 0, 0], 0), Point::new(vec![0, 1, 0], 1));
        toggle_block(&mut doc, &sel, &BlockFormat::List(ListType::Task));

        assert_eq!(doc.children.len(), 1);
        let list = doc.children[0].as_element().unwrap();
        assert_eq!(list.kind, ElementKind::List(List { list_type: ListType::Task }));
        for item in &list.children {
            assert_eq!(
                item.as_element().unwrap().kind,
                ElementKind::ListItem(ListItem { checked: Some(false) })
            );
        }
    }

    #[test]
    fn test_table_cells_are_not_converted() {
        let mut doc = Document::new(vec![Element::table(1, 1, false, None).into()]);
        let result = toggle_block(&mut doc, &Selection::caret(vec![0, 0, 0, 0], 0), &BlockFormat::Heading(1));
        assert!(!result.applied);
        assert!(doc.children[0].is_table());
    }

    #[test]
    fn test_alignment_keeps_through_heading_toggle() {
        let mut doc = three_paragraphs();
        let sel = Selection::caret(vec![0, 0], 0);
        assert!(set_alignment(&mut doc, &sel, Alignment::Center).applied);
        assert!(!set_alignment(&mut doc, &sel, Alignment::Center).applied);

        toggle_block(&mut doc, &sel, &BlockFormat::Heading(1));
        assert_eq!(
            doc.children[0].as_element().and_then(|e| e.kind.alignment()),
            Some(Alignment::Center)
        );
    }

    #[test]
    fn test_alignment_on_image_slot() {
        let mut doc = Document::new(vec![Element::void(ElementKind::Image(Image {
            src: "https://example.com/a.png".into(),
            alt: "a".into(),
            width: None,
            height: None,
            caption: None,
            alignment: Alignment::Left,
        }))
        .into()]);
        assert!(set_alignment(&mut doc, &Selection::caret(vec![0, 0], 0), Alignment::Right).applied);
        assert_eq!(
            doc.children[0].as_element().and_then(|e| e.kind.alignment()),
            Some(Alignment::Right)
        );
    }
}
