//! Flat run view of a text-bearing block.
//!
//! Range edits (marks, links) flatten each touched block into runs, split
//! the runs at the range edges, edit them, and rebuild the block's
//! children. Block paths never change during such an edit, so selections
//! are carried across as block-relative character offsets.

use crate::selection::{byte_index, leaves_between, Point, Selection};
use xmledit_model::*;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
    pub text: String,
    pub marks: Marks,
    pub link: Option<Link>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A character range inside one text-bearing block
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockRange {
    pub path: Vec<usize>,
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Runs of a block whose children are text leaves and links over text
pub(crate) fn flatten(children: &[Node]) -> Option<Vec<Run>> {
    let mut runs = Vec::new();
    for child in children {
        match child {
            Node::Text(text) => runs.push(Run {
                text: text.text.clone(),
                marks: text.marks,
                link: None,
            }),
            Node::Element(el) => {
                let ElementKind::Link(link) = &el.kind else {
                    return None;
                };
                for inner in &el.children {
                    let Node::Text(text) = inner else {
                        return None;
                    };
                    runs.push(Run {
                        text: text.text.clone(),
                        marks: text.marks,
                        link: Some(link.clone()),
                    });
                }
            }
        }
    }
    Some(runs)
}

/// Rebuild block children, merging neighbours with identical formatting
pub(crate) fn rebuild(runs: Vec<Run>) -> Vec<Node> {
    let mut merged: Vec<Run> = Vec::new();
    for run in runs.into_iter().filter(|run| !run.text.is_empty()) {
        if let Some(last) = merged.last_mut() {
            if last.marks == run.marks && last.link == run.link {
                last.text.push_str(&run.text);
                continue;
            }
        }
        merged.push(run);
    }

    let mut nodes: Vec<Node> = Vec::new();
    for run in merged {
        let leaf = Node::Text(Text::styled(run.text, run.marks));
        let Some(link) = run.link else {
            nodes.push(leaf);
            continue;
        };
        if let Some(Node::Element(previous)) = nodes.last_mut() {
            if matches!(&previous.kind, ElementKind::Link(l) if *l == link) {
                previous.children.push(leaf);
                continue;
            }
        }
        nodes.push(Element::new(ElementKind::Link(link), vec![leaf]).into());
    }

    if nodes.is_empty() {
        nodes.push(Node::empty_text());
    }
    nodes
}

/// Ensure a run boundary at character offset `at`
pub(crate) fn split_at(runs: &mut Vec<Run>, at: usize) {
    let mut acc = 0;
    for index in 0..runs.len() {
        let len = runs[index].len();
        if at > acc && at < acc + len {
            let byte = byte_index(&runs[index].text, at - acc);
            let tail = runs[index].text.split_off(byte);
            let mut next = runs[index].clone();
            next.text = tail;
            runs.insert(index + 1, next);
            return;
        }
        acc += len;
    }
}

/// Apply `edit` to every non-empty run inside `start..end`
pub(crate) fn edit_range(runs: &mut Vec<Run>, start: usize, end: usize, mut edit: impl FnMut(&mut Run)) {
    split_at(runs, end);
    split_at(runs, start);
    let mut acc = 0;
    for run in runs.iter_mut() {
        let len = run.len();
        if len > 0 && acc >= start && acc + len <= end {
            edit(run);
        }
        acc += len;
    }
}

/// Insert `run` at character offset `at`
pub(crate) fn insert_at(runs: &mut Vec<Run>, at: usize, run: Run) {
    split_at(runs, at);
    let mut acc = 0;
    let mut index = runs.len();
    for (i, existing) in runs.iter().enumerate() {
        if acc >= at {
            index = i;
            break;
        }
        acc += existing.len();
    }
    runs.insert(index, run);
}

/// Runs overlapping `start..end`, or touching `start` when the range is empty
pub(crate) fn runs_in_range(runs: &[Run], start: usize, end: usize) -> Vec<&Run> {
    let mut out = Vec::new();
    let mut acc = 0;
    for run in runs {
        let len = run.len();
        let hit = if start == end {
            acc <= start && start <= acc + len
        } else {
            acc < end && start < acc + len && len > 0
        };
        if hit {
            out.push(run);
        }
        acc += len;
    }
    out
}

/// Drop link from every contiguous link group touching `start..end`
pub(crate) fn unlink_range(runs: &mut [Run], start: usize, end: usize) -> bool {
    let touched: Vec<Link> = runs_in_range(runs, start, end)
        .into_iter()
        .filter_map(|run| run.link.clone())
        .collect();
    if touched.is_empty() {
        return false;
    }

    // a group is a maximal stretch of runs sharing one link
    let mut changed = false;
    let mut group_start = 0;
    while group_start < runs.len() {
        let link = runs[group_start].link.clone();
        let mut group_end = group_start + 1;
        while group_end < runs.len() && runs[group_end].link == link {
            group_end += 1;
        }
        let (from, to) = span_of(runs, group_start, group_end);
        let touches = if start == end {
            from <= start && start <= to
        } else {
            from < end && start < to
        };
        if touches && link.as_ref().is_some_and(|l| touched.contains(l)) {
            for run in &mut runs[group_start..group_end] {
                run.link = None;
            }
            changed = true;
        }
        group_start = group_end;
    }
    changed
}

fn span_of(runs: &[Run], from: usize, to: usize) -> (usize, usize) {
    let before: usize = runs[..from].iter().map(Run::len).sum();
    let inside: usize = runs[from..to].iter().map(Run::len).sum();
    (before, before + inside)
}

/// Path of the text-bearing block that holds the leaf at `leaf`
///
/// Leaves inside a link resolve to the block around the link. Leaves of
/// void elements and stray leaves at the root have no block.
pub(crate) fn text_block_path(doc: &Document, leaf: &[usize]) -> Option<Vec<usize>> {
    let (_, parent) = leaf.split_last()?;
    if parent.is_empty() {
        return None;
    }
    let el = doc.get(parent)?.as_element()?;
    let block = if el.is_inline() {
        let (_, grand) = parent.split_last()?;
        if grand.is_empty() {
            return None;
        }
        grand
    } else {
        parent
    };
    let block_el = doc.get(block)?.as_element()?;
    if block_el.tag().holds_text() && !block_el.is_inline() {
        Some(block.to_vec())
    } else {
        None
    }
}

/// Character offset of `point` within its block's text
pub(crate) fn offset_in_block(children: &[Node], relative: &[usize], offset: usize) -> usize {
    let Some((&first, rest)) = relative.split_first() else {
        return offset;
    };
    let mut acc: usize = children.iter().take(first).map(|c| char_len(&c.string())).sum();
    if let (Some(&inner), Some(Node::Element(el))) = (rest.first(), children.get(first)) {
        acc += el
            .children
            .iter()
            .take(inner)
            .map(|c| char_len(&c.string()))
            .sum::<usize>();
    }
    acc + offset
}

/// The leaf position at character `offset` of a block's text
pub(crate) fn point_at(children: &[Node], block_path: &[usize], offset: usize) -> Point {
    let mut acc = 0;
    let mut last: Option<(Vec<usize>, usize)> = None;

    let mut leaves: Vec<(Vec<usize>, usize)> = Vec::new();
    for (i, child) in children.iter().enumerate() {
        match child {
            Node::Text(text) => leaves.push((vec![i], char_len(&text.text))),
            Node::Element(el) => {
                for (j, inner) in el.children.iter().enumerate() {
                    if let Node::Text(text) = inner {
                        leaves.push((vec![i, j], char_len(&text.text)));
                    }
                }
            }
        }
    }

    for (relative, len) in leaves {
        let path = [block_path, relative.as_slice()].concat();
        if offset <= acc + len {
            return Point::new(path, offset - acc);
        }
        acc += len;
        last = Some((path, len));
    }

    match last {
        Some((path, len)) => Point::new(path, len),
        None => {
            let mut path = block_path.to_vec();
            path.push(0);
            Point::new(path, 0)
        }
    }
}

/// Locate a point as (block path, character offset in the block)
pub(crate) fn locate(doc: &Document, point: &Point) -> Option<(Vec<usize>, usize)> {
    let block_path = text_block_path(doc, &point.path)?;
    let block = doc.get(&block_path)?.as_element()?;
    let offset = offset_in_block(&block.children, &point.path[block_path.len()..], point.offset);
    Some((block_path, offset))
}

/// Per-block character ranges covered by a selection, in document order
pub(crate) fn block_ranges(doc: &Document, selection: &Selection) -> Vec<BlockRange> {
    let (start, end) = selection.ordered();
    let start_block = locate(doc, start);
    let end_block = locate(doc, end);

    let mut ranges: Vec<BlockRange> = Vec::new();
    for leaf in leaves_between(doc, &start.path, &end.path) {
        let Some(path) = text_block_path(doc, &leaf) else {
            continue;
        };
        if ranges.last().is_some_and(|range| range.path == path) {
            continue;
        }
        let Some(block) = doc.get(&path) else {
            continue;
        };
        let len = char_len(&block.string());
        let from = match &start_block {
            Some((p, offset)) if *p == path => *offset,
            _ => 0,
        };
        let to = match &end_block {
            Some((p, offset)) if *p == path => *offset,
            _ => len,
        };
        ranges.push(BlockRange { path, start: from, end: to });
    }
    ranges
}

/// Replace the children of the block at `path`
pub(crate) fn replace_block_children(doc: &mut Document, path: &[usize], children: Vec<Node>) {
    if let Some(slot) = doc.children_at_mut(path) {
        *slot = children;
    }
}
