use crate::ast::*;

/// Visitor pattern for traversing document nodes immutably
///
/// Default implementations walk the entire tree.
/// Override specific visit_* methods to act on particular nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &Text) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming document nodes
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }

    fn visit_text_mut(&mut self, _text: &mut Text) {
        // Leaf node, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for node in &doc.children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Text(text) => visitor.visit_text(text),
        Node::Element(element) => visitor.visit_element(element),
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for child in &element.children {
        visitor.visit_node(child);
    }
}

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    for node in &mut doc.children {
        visitor.visit_node_mut(node);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Text(text) => visitor.visit_text_mut(text),
        Node::Element(element) => visitor.visit_element_mut(element),
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    for child in &mut element.children {
        visitor.visit_node_mut(child);
    }
}

/// Counts every node in a document, used to bound fixed-point loops
#[derive(Debug, Default)]
pub struct NodeCounter {
    pub count: usize,
}

impl Visitor for NodeCounter {
    fn visit_node(&mut self, node: &Node) {
        self.count += 1;
        walk_node(self, node);
    }
}
