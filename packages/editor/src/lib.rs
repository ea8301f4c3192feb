//! # xmledit Editor
//!
//! Editing engine for structured rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: XML text ⇄ Document                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document + Selection                │
//! │  - Validate requests at the boundary        │
//! │  - Apply mutations (marks, blocks, inserts) │
//! │  - Normalize to a fixed point               │
//! │  - Answer toolbar queries                   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: toolbar, dialogs, rendering           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: XML is a derived view
//! 2. **Validate once**: requests are checked when a mutation is built
//! 3. **Mutations never fail**: without a selection they are skipped
//! 4. **Always normalized**: every applied mutation ends in a repair pass
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmledit_editor::{Editor, EditorConfig, Mutation, Selection};
//! use xmledit_model::Mark;
//!
//! let mut editor = Editor::from_xml(xml, EditorConfig::default())?;
//! editor.set_selection(Some(Selection::caret(vec![0, 0], 0)));
//! editor.apply(Mutation::ToggleMark(Mark::Bold));
//! let xml = editor.to_xml();
//! ```

mod blocks;
mod config;
mod editor;
mod errors;
mod inline;
mod mutations;
mod normalize;
mod queries;
mod selection;
mod validation;

pub use config::EditorConfig;
pub use editor::Editor;
pub use errors::{EditorError, ValidationError};
pub use mutations::{apply_mutation, BlockFormat, Mutation, MutationResult};
pub use normalize::{
    normalize, EmptyCell, EmptyRow, EmptyTable, NormalizeRule, Normalizer, OrphanCell, OrphanRow, Repair,
    RootShape, RowChildren, TableChildren, Target, VoidContent,
};
pub use queries::{
    active_marks, current_element, find, is_block_active, is_heading_active, is_link_active, is_mark_active,
    leaf_excerpt,
};
pub use selection::{leaf_paths, leaves_between, Point, Selection};
pub use validation::{
    heading_level, is_valid_tag_name, is_valid_url, ImageRequest, LinkRequest, RawXmlRequest, TableRequest,
    VideoRequest,
};

// Re-export model types for convenience
pub use xmledit_model::{Document, Element, ElementKind, Mark, Marks, Node, Tag, Text};
