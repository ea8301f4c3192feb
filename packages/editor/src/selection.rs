//! Selection model: points address text leaves by child-index path.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;
use xmledit_model::{Document, Node};

/// A position inside a text leaf
///
/// `offset` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Index of the top-level block this point sits in
    pub fn top_level(&self) -> Option<usize> {
        self.path.first().copied()
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Cursor at `offset` in the leaf at `path`
    pub fn caret(path: Vec<usize>, offset: usize) -> Self {
        Self::collapsed(Point::new(path, offset))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus in document order
    pub fn ordered(&self) -> (&Point, &Point) {
        if self.anchor <= self.focus {
            (&self.anchor, &self.focus)
        } else {
            (&self.focus, &self.anchor)
        }
    }

    pub fn start(&self) -> &Point {
        self.ordered().0
    }

    pub fn end(&self) -> &Point {
        self.ordered().1
    }

    /// Check both points against `doc` and clamp their offsets
    ///
    /// Returns `None`, with a warning, when either path does not lead to a
    /// text leaf. Callers treat that the same as having no selection.
    pub fn resolve(&self, doc: &Document) -> Option<Selection> {
        let anchor = clamp(doc, &self.anchor)?;
        let focus = clamp(doc, &self.focus)?;
        Some(Selection { anchor, focus })
    }
}

fn clamp(doc: &Document, point: &Point) -> Option<Point> {
    match doc.get(&point.path) {
        Some(Node::Text(text)) => Some(Point {
            path: point.path.clone(),
            offset: point.offset.min(text.text.chars().count()),
        }),
        _ => {
            warn!(path = ?point.path, "selection point does not address a text leaf");
            None
        }
    }
}

/// Paths of every text leaf, in document order
pub fn leaf_paths(doc: &Document) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_leaves(&doc.children, &mut path, &mut out);
    out
}

fn collect_leaves(nodes: &[Node], path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        match node {
            Node::Text(_) => out.push(path.clone()),
            Node::Element(el) => collect_leaves(&el.children, path, out),
        }
        path.pop();
    }
}

/// Leaf paths from `start` to `end` inclusive
pub fn leaves_between(doc: &Document, start: &[usize], end: &[usize]) -> Vec<Vec<usize>> {
    leaf_paths(doc)
        .into_iter()
        .filter(|path| path.as_slice() >= start && path.as_slice() <= end)
        .collect()
}

/// Convert a character offset into a byte index of `text`
pub(crate) fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmledit_model::Element;

    fn doc() -> Document {
        Document::new(vec![
            Element::paragraph("first").into(),
            Element::table(1, 2, false, None).into(),
            Element::paragraph("last").into(),
        ])
    }

    #[test]
    fn test_points_order_by_path_then_offset() {
        let a = Point::new(vec![0, 0], 4);
        let b = Point::new(vec![1, 0, 0, 0], 0);
        let c = Point::new(vec![1, 0, 0, 0], 1);
        assert!(a < b && b < c);

        let backwards = Selection::new(c.clone(), a.clone());
        assert_eq!(backwards.start(), &a);
        assert_eq!(backwards.end(), &c);
    }

    #[test]
    fn test_leaf_paths_in_document_order() {
        assert_eq!(
            leaf_paths(&doc()),
            vec![vec![0, 0], vec![1, 0, 0, 0], vec![1, 0, 1, 0], vec![2, 0]]
        );
        assert_eq!(leaves_between(&doc(), &[1, 0, 1, 0], &[2, 0]).len(), 2);
    }

    #[test]
    fn test_resolve_clamps_and_rejects_stale_paths() {
        let sel = Selection::caret(vec![2, 0], 99);
        assert_eq!(sel.resolve(&doc()), Some(Selection::caret(vec![2, 0], 4)));
        assert_eq!(Selection::caret(vec![1, 0], 0).resolve(&doc()), None);
        assert_eq!(Selection::caret(vec![7, 0], 0).resolve(&doc()), None);
    }

    #[test]
    fn test_byte_index_counts_chars() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("abc", 10), 3);
    }
}
