//! # Editor Session
//!
//! Owns one document, its selection and the normalizer.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Normalize → (Mutate → Normalize)* → Serialize
//!   ↓        ↓              ↓                  ↓
//!  XML    Document    Document + Selection    XML
//! ```
//!
//! The document is normalized on load and after every applied mutation,
//! so readers always see a tree satisfying the structural invariants.

use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationResult};
use crate::normalize::Normalizer;
use crate::queries;
use crate::selection::Selection;
use tracing::{info, instrument};
use xmledit_model::{Document, Element, Mark, Marks, Tag};
use xmledit_parser::{Parser, Serializer, Validation};

#[derive(Debug)]
pub struct Editor {
    document: Document,
    selection: Option<Selection>,

    /// Current version number (increments on each applied mutation or load)
    version: u64,

    normalizer: Normalizer,
    config: EditorConfig,
}

impl Editor {
    /// Session over a blank document
    pub fn new(config: EditorConfig) -> Self {
        let normalizer = Normalizer::new().with_max_passes(config.max_normalize_passes);
        Self {
            document: Document::blank(),
            selection: None,
            version: 0,
            normalizer,
            config,
        }
    }

    pub fn from_xml(xml: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let mut editor = Self::new(config);
        editor.load_xml(xml)?;
        editor.version = 0;
        Ok(editor)
    }

    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let mut editor = Self::new(config);
        editor.load_json(json)?;
        editor.version = 0;
        Ok(editor)
    }

    pub fn from_document(document: Document, config: EditorConfig) -> Self {
        let mut editor = Self::new(config);
        editor.replace_document(document);
        editor.version = 0;
        editor
    }

    /// Swap in a custom normalizer, e.g. one with a different fallback rule
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self.normalizer.normalize_in_place(&mut self.document);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Set the selection; stale points clear it
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection.and_then(|s| s.resolve(&self.document));
    }

    /// Replace the document with parsed XML
    ///
    /// On a parse error the current document is left untouched.
    pub fn load_xml(&mut self, xml: &str) -> Result<(), EditorError> {
        let document = Parser::with_options(xml, self.config.codec.clone()).parse_document()?;
        self.replace_document(document);
        Ok(())
    }

    /// Replace the document with its JSON form
    pub fn load_json(&mut self, json: &str) -> Result<(), EditorError> {
        let document: Document = serde_json::from_str(json)?;
        self.replace_document(document);
        Ok(())
    }

    fn replace_document(&mut self, mut document: Document) {
        let repairs = self.normalizer.normalize_in_place(&mut document);
        info!(blocks = document.children.len(), repairs, "loaded document");
        self.document = document;
        self.selection = None;
        self.version += 1;
    }

    /// Apply a mutation at the current selection, then normalize
    #[instrument(skip(self, mutation), fields(mutation = mutation.name(), version = self.version))]
    pub fn apply(&mut self, mutation: Mutation) -> MutationResult {
        let result = mutation.apply(&mut self.document, self.selection.as_ref(), &self.config);
        if !result.applied {
            return result;
        }

        self.normalizer.normalize_in_place(&mut self.document);
        self.version += 1;

        let next = result.selection.clone().or_else(|| self.selection.take());
        self.selection = next.and_then(|s| s.resolve(&self.document));
        result
    }

    /// Apply mutations in order, returning how many were applied
    pub fn apply_all(&mut self, mutations: impl IntoIterator<Item = Mutation>) -> usize {
        mutations
            .into_iter()
            .map(|mutation| self.apply(mutation))
            .filter(|result| result.applied)
            .count()
    }

    pub fn to_xml(&self) -> String {
        Serializer::with_options(self.config.codec.clone()).serialize(&self.document)
    }

    /// Root children without the declaration and `<document>` wrapper
    pub fn to_fragment(&self) -> String {
        Serializer::with_options(self.config.codec.clone()).serialize_fragment(&self.document.children)
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Check XML without loading it
    pub fn validate(&self, xml: &str) -> Validation {
        match Parser::with_options(xml, self.config.codec.clone()).parse_document() {
            Ok(_) => Validation::ok(),
            Err(err) => Validation::failed(&err),
        }
    }

    pub fn is_mark_active(&self, mark: Mark) -> bool {
        queries::is_mark_active(&self.document, self.selection.as_ref(), mark)
    }

    pub fn active_marks(&self) -> Marks {
        queries::active_marks(&self.document, self.selection.as_ref())
    }

    pub fn is_block_active(&self, tag: Tag) -> bool {
        queries::is_block_active(&self.document, self.selection.as_ref(), tag)
    }

    pub fn is_heading_active(&self, level: u8) -> bool {
        queries::is_heading_active(&self.document, self.selection.as_ref(), level)
    }

    pub fn is_link_active(&self) -> bool {
        queries::is_link_active(&self.document, self.selection.as_ref())
    }

    pub fn current_element(&self) -> Option<&Element> {
        queries::current_element(&self.document, self.selection.as_ref())
    }

    pub fn find(&self, needle: &str) -> Vec<Selection> {
        queries::find(&self.document, needle)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmledit_model::Node;

    #[test]
    fn test_new_editor_is_blank() {
        let editor = Editor::default();
        assert_eq!(editor.document(), &Document::blank());
        assert_eq!(editor.version(), 0);
        assert!(editor.selection().is_none());
    }

    #[test]
    fn test_failed_load_keeps_document() {
        let mut editor = Editor::from_xml("<document><p>kept</p></document>", EditorConfig::default()).unwrap();
        let version = editor.version();
        assert!(editor.load_xml("<document><p>").is_err());
        assert_eq!(editor.plain_text(), "kept");
        assert_eq!(editor.version(), version);
    }

    #[test]
    fn test_load_normalizes() {
        let editor = Editor::from_document(
            Document::new(vec![Node::Element(Element::table(0, 0, false, None))]),
            EditorConfig::default(),
        );
        let table = &editor.document().children[0];
        assert_eq!(table.children().len(), 1);
        assert_eq!(table.children()[0].children(), &[Node::Element(Element::table_cell(""))]);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_skipped_mutation_keeps_version() {
        let mut editor = Editor::default();
        let result = editor.apply(Mutation::ToggleMark(Mark::Bold));
        assert!(!result.applied);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn test_stale_selection_is_dropped() {
        let mut editor = Editor::default();
        editor.set_selection(Some(Selection::caret(vec![3, 0], 0)));
        assert!(editor.selection().is_none());
        editor.set_selection(Some(Selection::caret(vec![0, 0], 5)));
        assert_eq!(editor.selection(), Some(&Selection::caret(vec![0, 0], 0)));
    }
}
