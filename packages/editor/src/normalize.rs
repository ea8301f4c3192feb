//! # Normalizer
//!
//! Structural repair run after every mutation.
//!
//! Each pass walks the tree top-down and asks every rule, in order, about
//! each node. The first rule that reports a [`Repair`] ends the pass; the
//! repair is applied and a new pass starts, because a fix can expose a new
//! violation one level up or down. The loop stops at the first pass with
//! nothing to repair (the fixed point) or when the pass bound is reached.
//!
//! Shapes no built-in rule covers go to a single fallback rule. The default
//! fallback keeps void elements holding exactly one empty leaf and gives
//! empty text-bearing blocks their leaf.

use std::fmt;
use tracing::{debug, warn};
use xmledit_model::*;

/// What a rule is looking at
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The root sequence
    Root(&'a [Node]),
    /// A node below the root; `parent` is `None` for top-level nodes
    Node {
        node: &'a Node,
        parent: Option<Tag>,
    },
}

/// A single structural fix, relative to the target
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// Drop the target itself from its parent
    Remove,
    RemoveChild(usize),
    InsertChild(usize, Node),
    /// Replace a child with a paragraph holding it
    WrapChildInParagraph(usize),
    ReplaceChildren(Vec<Node>),
}

/// A structural invariant and its repair
pub trait NormalizeRule: fmt::Debug {
    fn name(&self) -> &'static str;

    fn check(&self, target: Target<'_>) -> Option<Repair>;
}

fn element_of<'a>(target: Target<'a>, tag: Tag) -> Option<(&'a Element, Option<Tag>)> {
    match target {
        Target::Node {
            node: Node::Element(el),
            parent,
        } if el.tag() == tag => Some((el, parent)),
        _ => None,
    }
}

fn first_child_not(el: &Element, tag: Tag) -> Option<usize> {
    el.children.iter().position(|child| !child.is_tag(tag))
}

fn empty_row() -> Node {
    Element::table_row(false, vec![Element::table_cell("")]).into()
}

/// Tables hold only rows
#[derive(Debug)]
pub struct TableChildren;

impl NormalizeRule for TableChildren {
    fn name(&self) -> &'static str {
        "table-children"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (table, _) = element_of(target, Tag::Table)?;
        first_child_not(table, Tag::TableRow).map(Repair::RemoveChild)
    }
}

#[derive(Debug)]
pub struct EmptyTable;

impl NormalizeRule for EmptyTable {
    fn name(&self) -> &'static str {
        "empty-table"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (table, _) = element_of(target, Tag::Table)?;
        table
            .children
            .is_empty()
            .then(|| Repair::InsertChild(0, empty_row()))
    }
}

/// Rows hold only cells
#[derive(Debug)]
pub struct RowChildren;

impl NormalizeRule for RowChildren {
    fn name(&self) -> &'static str {
        "row-children"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (row, _) = element_of(target, Tag::TableRow)?;
        first_child_not(row, Tag::TableCell).map(Repair::RemoveChild)
    }
}

#[derive(Debug)]
pub struct EmptyRow;

impl NormalizeRule for EmptyRow {
    fn name(&self) -> &'static str {
        "empty-row"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (row, _) = element_of(target, Tag::TableRow)?;
        row.children
            .is_empty()
            .then(|| Repair::InsertChild(0, Element::table_cell("").into()))
    }
}

/// Rows live in tables
#[derive(Debug)]
pub struct OrphanRow;

impl NormalizeRule for OrphanRow {
    fn name(&self) -> &'static str {
        "orphan-row"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (_, parent) = element_of(target, Tag::TableRow)?;
        (parent != Some(Tag::Table)).then_some(Repair::Remove)
    }
}

/// Cells live in rows
#[derive(Debug)]
pub struct OrphanCell;

impl NormalizeRule for OrphanCell {
    fn name(&self) -> &'static str {
        "orphan-cell"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (_, parent) = element_of(target, Tag::TableCell)?;
        (parent != Some(Tag::TableRow)).then_some(Repair::Remove)
    }
}

#[derive(Debug)]
pub struct EmptyCell;

impl NormalizeRule for EmptyCell {
    fn name(&self) -> &'static str {
        "empty-cell"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let (cell, _) = element_of(target, Tag::TableCell)?;
        cell.children
            .is_empty()
            .then(|| Repair::InsertChild(0, Node::empty_text()))
    }
}

/// The root is never empty and holds no bare text
#[derive(Debug)]
pub struct RootShape;

impl NormalizeRule for RootShape {
    fn name(&self) -> &'static str {
        "root-shape"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let Target::Root(children) = target else {
            return None;
        };
        if children.is_empty() {
            return Some(Repair::InsertChild(0, Element::empty_paragraph().into()));
        }
        children
            .iter()
            .position(Node::is_text)
            .map(Repair::WrapChildInParagraph)
    }
}

/// Default fallback for shapes the table and root rules do not cover
///
/// A void element holds exactly one empty text leaf; a text-bearing block
/// with no children gets one.
#[derive(Debug)]
pub struct VoidContent;

impl NormalizeRule for VoidContent {
    fn name(&self) -> &'static str {
        "void-content"
    }

    fn check(&self, target: Target<'_>) -> Option<Repair> {
        let Target::Node {
            node: Node::Element(el),
            ..
        } = target
        else {
            return None;
        };
        if el.is_void() {
            let canonical = matches!(el.children.as_slice(), [Node::Text(leaf)] if leaf.is_empty_slot());
            return (!canonical).then(|| Repair::ReplaceChildren(vec![Node::empty_text()]));
        }
        (el.tag().holds_text() && el.children.is_empty()).then(|| Repair::InsertChild(0, Node::empty_text()))
    }
}

/// Fixed-point structural repair engine
#[derive(Debug)]
pub struct Normalizer {
    rules: Vec<Box<dyn NormalizeRule>>,
    fallback: Option<Box<dyn NormalizeRule>>,
    max_passes: Option<usize>,
}

impl Normalizer {
    /// Create a normalizer with the built-in rules and the default fallback
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(TableChildren),
                Box::new(EmptyTable),
                Box::new(RowChildren),
                Box::new(EmptyRow),
                Box::new(OrphanRow),
                Box::new(OrphanCell),
                Box::new(EmptyCell),
                Box::new(RootShape),
            ],
            fallback: Some(Box::new(VoidContent)),
            max_passes: None,
        }
    }

    /// Replace the fallback consulted after the built-in rules
    pub fn with_fallback(mut self, fallback: Box<dyn NormalizeRule>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Fix the pass bound instead of deriving it from the tree size
    pub fn with_max_passes(mut self, max_passes: Option<usize>) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .chain(self.fallback.iter())
            .map(|rule| rule.name())
            .collect()
    }

    pub fn normalize(&self, mut doc: Document) -> Document {
        self.normalize_in_place(&mut doc);
        doc
    }

    /// Repair `doc` until no rule fires; returns the number of repairs made
    pub fn normalize_in_place(&self, doc: &mut Document) -> usize {
        let bound = self.max_passes.unwrap_or_else(|| {
            let mut counter = NodeCounter::default();
            counter.visit_document(doc);
            (counter.count + 1) * 4
        });

        let mut repairs = 0;
        while repairs < bound {
            let Some((path, rule, repair)) = self.next_repair(doc) else {
                return repairs;
            };
            debug!(rule, path = ?path, repair = ?repair, "normalizer repair");
            apply_repair(doc, &path, repair);
            repairs += 1;
        }

        if self.next_repair(doc).is_some() {
            warn!(bound, "normalization stopped at its pass bound before reaching a fixed point");
        }
        repairs
    }

    /// Whether `doc` is already at the fixed point
    pub fn is_normalized(&self, doc: &Document) -> bool {
        self.next_repair(doc).is_none()
    }

    fn check(&self, target: Target<'_>) -> Option<(&'static str, Repair)> {
        self.rules
            .iter()
            .chain(self.fallback.iter())
            .find_map(|rule| rule.check(target).map(|repair| (rule.name(), repair)))
    }

    fn next_repair(&self, doc: &Document) -> Option<(Vec<usize>, &'static str, Repair)> {
        if let Some((rule, repair)) = self.check(Target::Root(&doc.children)) {
            return Some((Vec::new(), rule, repair));
        }
        let mut path = Vec::new();
        self.scan(&doc.children, None, &mut path)
    }

    fn scan(
        &self,
        nodes: &[Node],
        parent: Option<Tag>,
        path: &mut Vec<usize>,
    ) -> Option<(Vec<usize>, &'static str, Repair)> {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            if let Some((rule, repair)) = self.check(Target::Node { node, parent }) {
                return Some((path.clone(), rule, repair));
            }
            if let Node::Element(el) = node {
                if let Some(found) = self.scan(&el.children, Some(el.tag()), path) {
                    return Some(found);
                }
            }
            path.pop();
        }
        None
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_repair(doc: &mut Document, path: &[usize], repair: Repair) {
    if let Repair::Remove = repair {
        if let Some((&index, parent)) = path.split_last() {
            if let Some(siblings) = doc.children_at_mut(parent) {
                siblings.remove(index);
            }
        }
        return;
    }

    let Some(children) = doc.children_at_mut(path) else {
        return;
    };
    match repair {
        Repair::Remove => {}
        Repair::RemoveChild(index) => {
            children.remove(index);
        }
        Repair::InsertChild(index, node) => children.insert(index, node),
        Repair::WrapChildInParagraph(index) => {
            let node = children.remove(index);
            children.insert(
                index,
                Element::new(ElementKind::Paragraph(Paragraph::default()), vec![node]).into(),
            );
        }
        Repair::ReplaceChildren(nodes) => *children = nodes,
    }
}

/// Normalize with the default rule set
pub fn normalize(doc: Document) -> Document {
    Normalizer::new().normalize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(children: Vec<Node>) -> Node {
        Element::new(ElementKind::Table(Table::default()), children).into()
    }

    fn row(children: Vec<Node>) -> Node {
        Element::new(ElementKind::TableRow(TableRow::default()), children).into()
    }

    #[test]
    fn test_scenario_empty_root_gets_paragraph() {
        assert_eq!(normalize(Document::default()), Document::blank());
    }

    #[test]
    fn test_scenario_stray_paragraph_in_row_is_dropped() {
        let doc = Document::new(vec![table(vec![row(vec![
            Element::table_cell("a").into(),
            Element::paragraph("stray").into(),
            Element::table_cell("b").into(),
        ])])]);
        let normalized = normalize(doc);
        let expected = Document::new(vec![table(vec![row(vec![
            Element::table_cell("a").into(),
            Element::table_cell("b").into(),
        ])])]);
        assert_eq!(normalized, expected);
    }

    #[test]
    fn test_table_drops_text_and_non_rows() {
        let doc = Document::new(vec![table(vec![
            Node::text("loose"),
            Element::paragraph("p").into(),
            row(vec![Element::table_cell("c").into()]),
        ])]);
        let normalized = normalize(doc);
        let table = normalized.children[0].as_element().unwrap();
        assert_eq!(table.children.len(), 1);
        assert!(table.children[0].is_table_row());
    }

    #[test]
    fn test_empty_table_and_row_are_filled() {
        let normalized = normalize(Document::new(vec![table(vec![]), table(vec![row(vec![])])]));
        for block in &normalized.children {
            let table = block.as_element().unwrap();
            assert_eq!(table.children.len(), 1);
            let row = table.children[0].as_element().unwrap();
            assert_eq!(row.children, vec![Node::Element(Element::table_cell(""))]);
        }
    }

    #[test]
    fn test_orphan_rows_and_cells_are_removed() {
        let doc = Document::new(vec![
            row(vec![Element::table_cell("x").into()]),
            Element::list(ListType::Unordered, vec![Element::table_cell("y")]).into(),
            Element::paragraph("keep").into(),
        ]);
        let normalized = normalize(doc);
        assert_eq!(normalized.children.len(), 2);
        assert!(normalized.children[0].is_list());
        assert!(normalized.children[0].children().is_empty());
        assert!(normalized.children[1].is_paragraph());
    }

    #[test]
    fn test_empty_cell_gets_leaf() {
        let doc = Document::new(vec![table(vec![row(vec![Element::new(
            ElementKind::TableCell(TableCell::default()),
            vec![],
        )
        .into()])])]);
        let normalized = normalize(doc);
        assert_eq!(normalized.get(&[0, 0, 0, 0]), Some(&Node::empty_text()));
    }

    #[test]
    fn test_root_text_is_wrapped() {
        let doc = Document::new(vec![Node::text("bare"), Element::paragraph("p").into()]);
        let normalized = normalize(doc);
        assert_eq!(
            normalized,
            Document::new(vec![Element::paragraph("bare").into(), Element::paragraph("p").into()])
        );
    }

    #[test]
    fn test_void_elements_hold_one_empty_leaf() {
        let mut image = Element::void(ElementKind::Image(Image {
            src: "a.png".into(),
            alt: "a".into(),
            width: None,
            height: None,
            caption: None,
            alignment: Alignment::Left,
        }));
        image.children = vec![Node::text("typed into"), Node::text("more")];
        let normalized = normalize(Document::new(vec![image.into()]));
        assert_eq!(normalized.children[0].children(), &[Node::empty_text()]);
    }

    #[test]
    fn test_without_fallback_leaves_voids_alone() {
        let mut raw = Element::void(ElementKind::RawXml(RawXml {
            tag_name: "x".into(),
            attributes: Default::default(),
            raw_xml: "<x/>".into(),
        }));
        raw.children.clear();
        let doc = Document::new(vec![raw.into()]);
        let normalizer = Normalizer::new().without_fallback();
        assert!(normalizer.is_normalized(&doc));
        assert!(!Normalizer::new().is_normalized(&doc));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let doc = Document::new(vec![
            Node::text("t"),
            table(vec![Node::text("x"), row(vec![]), row(vec![Element::paragraph("p").into()])]),
            row(vec![]),
        ]);
        let once = normalize(doc);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
        assert!(Normalizer::new().is_normalized(&once));
    }

    #[test]
    fn test_pass_bound_is_respected() {
        let doc = Document::new(vec![table(vec![
            Node::text("a"),
            Node::text("b"),
            Node::text("c"),
        ])]);
        let normalizer = Normalizer::new().with_max_passes(Some(1));
        let mut partial = doc.clone();
        assert_eq!(normalizer.normalize_in_place(&mut partial), 1);
        assert_eq!(partial.children[0].children().len(), 2);
    }

    #[test]
    fn test_rule_names_in_order() {
        let names = Normalizer::new().rule_names();
        assert_eq!(names.first(), Some(&"table-children"));
        assert_eq!(names.last(), Some(&"void-content"));
        assert_eq!(names.len(), 9);
    }
}
