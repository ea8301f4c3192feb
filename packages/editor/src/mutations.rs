//! # Mutations
//!
//! The closed set of edits a host can make to a document.
//!
//! Requests are validated once, when a mutation is constructed (see
//! [`crate::validation`]). Applying a mutation never fails: an operation
//! that needs a selection is skipped when there is none, and structural
//! fallout is left to the normalizer, which the [`crate::Editor`] runs after
//! every applied mutation.

use crate::blocks;
use crate::config::EditorConfig;
use crate::errors::ValidationError;
use crate::inline::*;
use crate::normalize::Normalizer;
use crate::queries::selected_runs;
use crate::selection::{Point, Selection};
use crate::validation::{self, ImageRequest, LinkRequest, RawXmlRequest, TableRequest, VideoRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xmledit_model::*;

/// Target shape for [`Mutation::ToggleBlock`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockFormat {
    Paragraph,
    Heading(u8),
    Blockquote { cite: Option<String> },
    CodeBlock { language: Option<String> },
    List(ListType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert an image after the focused block, then an empty paragraph
    InsertImage(Image),

    InsertVideo(Video),

    /// Insert user-authored markup as a raw-xml block
    InsertRawXml(RawXml),

    InsertTable {
        rows: usize,
        columns: usize,
        has_header: bool,
        caption: Option<String>,
    },

    /// Wrap the selection in a link, or insert linked text at a caret
    InsertLink { link: Link, text: Option<String> },

    /// Unwrap every link touching the selection
    RemoveLink,

    ToggleMark(Mark),

    ToggleBlock(BlockFormat),

    SetAlignment(Alignment),

    /// Replace every occurrence of `needle` inside single text leaves
    ReplaceAll { needle: String, replacement: String },
}

/// Outcome of applying a mutation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationResult {
    pub applied: bool,
    /// Selection after the edit; `None` keeps the caller's selection
    pub selection: Option<Selection>,
}

impl MutationResult {
    pub fn applied(selection: Option<Selection>) -> Self {
        Self {
            applied: true,
            selection,
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }
}

impl Mutation {
    pub fn insert_image(request: ImageRequest) -> Result<Self, ValidationError> {
        Ok(Mutation::InsertImage(request.validate()?))
    }

    pub fn insert_video(request: VideoRequest) -> Result<Self, ValidationError> {
        Ok(Mutation::InsertVideo(request.validate()?))
    }

    pub fn insert_raw_xml(request: RawXmlRequest) -> Result<Self, ValidationError> {
        Ok(Mutation::InsertRawXml(request.validate()?))
    }

    pub fn insert_table(request: TableRequest) -> Result<Self, ValidationError> {
        let request = request.validate()?;
        Ok(Mutation::InsertTable {
            rows: request.rows,
            columns: request.columns,
            has_header: request.has_header,
            caption: request.caption,
        })
    }

    pub fn insert_link(request: LinkRequest) -> Result<Self, ValidationError> {
        let (link, text) = request.validate()?;
        Ok(Mutation::InsertLink { link, text })
    }

    pub fn toggle_block(format: BlockFormat) -> Result<Self, ValidationError> {
        let format = match format {
            BlockFormat::Heading(level) => BlockFormat::Heading(validation::heading_level(level)?),
            BlockFormat::Blockquote { cite } => BlockFormat::Blockquote {
                cite: validation::cite(cite)?,
            },
            other => other,
        };
        Ok(Mutation::ToggleBlock(format))
    }

    pub fn replace_all(needle: impl Into<String>, replacement: impl Into<String>) -> Result<Self, ValidationError> {
        let needle = needle.into();
        if needle.is_empty() {
            return Err(ValidationError::EmptySearch);
        }
        Ok(Mutation::ReplaceAll {
            needle,
            replacement: replacement.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertImage(_) => "insert-image",
            Mutation::InsertVideo(_) => "insert-video",
            Mutation::InsertRawXml(_) => "insert-raw-xml",
            Mutation::InsertTable { .. } => "insert-table",
            Mutation::InsertLink { .. } => "insert-link",
            Mutation::RemoveLink => "remove-link",
            Mutation::ToggleMark(_) => "toggle-mark",
            Mutation::ToggleBlock(_) => "toggle-block",
            Mutation::SetAlignment(_) => "set-alignment",
            Mutation::ReplaceAll { .. } => "replace-all",
        }
    }

    /// Apply the mutation to `doc` at `selection`
    pub fn apply(&self, doc: &mut Document, selection: Option<&Selection>, config: &EditorConfig) -> MutationResult {
        let result = self.apply_inner(doc, selection, config);
        debug!(mutation = self.name(), applied = result.applied, "mutation");
        result
    }

    fn apply_inner(&self, doc: &mut Document, selection: Option<&Selection>, config: &EditorConfig) -> MutationResult {
        if let Mutation::ReplaceAll { needle, replacement } = self {
            return Self::apply_replace_all(doc, needle, replacement);
        }

        let Some(selection) = selection.and_then(|s| s.resolve(doc)) else {
            return MutationResult::skipped();
        };

        match self {
            Mutation::InsertImage(image) => {
                Self::apply_insert_block(doc, &selection, Element::void(ElementKind::Image(image.clone())))
            }
            Mutation::InsertVideo(video) => {
                Self::apply_insert_block(doc, &selection, Element::void(ElementKind::Video(video.clone())))
            }
            Mutation::InsertRawXml(raw) => {
                Self::apply_insert_block(doc, &selection, Element::void(ElementKind::RawXml(raw.clone())))
            }
            Mutation::InsertTable {
                rows,
                columns,
                has_header,
                caption,
            } => Self::apply_insert_block(
                doc,
                &selection,
                Element::table(*rows, *columns, *has_header, caption.clone()),
            ),
            Mutation::InsertLink { link, text } => {
                Self::apply_insert_link(doc, &selection, link, text.as_deref(), config)
            }
            Mutation::RemoveLink => Self::apply_remove_link(doc, &selection),
            Mutation::ToggleMark(mark) => Self::apply_toggle_mark(doc, &selection, *mark),
            Mutation::ToggleBlock(format) => blocks::toggle_block(doc, &selection, format),
            Mutation::SetAlignment(alignment) => blocks::set_alignment(doc, &selection, *alignment),
            Mutation::ReplaceAll { .. } => MutationResult::skipped(),
        }
    }

    fn apply_insert_block(doc: &mut Document, selection: &Selection, block: Element) -> MutationResult {
        let at = selection
            .focus
            .top_level()
            .map_or(doc.children.len(), |index| index + 1)
            .min(doc.children.len());

        doc.children.insert(at, block.into());
        doc.children.insert(at + 1, Element::empty_paragraph().into());

        MutationResult::applied(Some(Selection::caret(vec![at + 1, 0], 0)))
    }

    fn apply_toggle_mark(doc: &mut Document, selection: &Selection, mark: Mark) -> MutationResult {
        if selection.is_collapsed() {
            // a caret toggles the whole leaf under it
            let path = &selection.focus.path;
            if text_block_path(doc, path).is_none() {
                return MutationResult::skipped();
            }
            let Some(Node::Text(leaf)) = doc.get_mut(path) else {
                return MutationResult::skipped();
            };
            let value = !leaf.marks.get(mark);
            leaf.marks.set(mark, value);
            return MutationResult::applied(Some(selection.clone()));
        }

        let selected = selected_runs(doc, selection);
        if selected.is_empty() {
            return MutationResult::skipped();
        }
        let value = !selected.iter().all(|run| run.marks.get(mark));

        let anchor = locate(doc, &selection.anchor);
        let focus = locate(doc, &selection.focus);
        for range in block_ranges(doc, selection) {
            if range.is_empty() {
                continue;
            }
            edit_block(doc, &range.path, |runs| {
                edit_range(runs, range.start, range.end, |run| run.marks.set(mark, value));
                true
            });
        }

        MutationResult::applied(Some(carry_selection(doc, selection, anchor, focus)))
    }

    fn apply_insert_link(
        doc: &mut Document,
        selection: &Selection,
        link: &Link,
        text: Option<&str>,
        config: &EditorConfig,
    ) -> MutationResult {
        let mut link = link.clone();
        if link.target == LinkTarget::Blank && link.rel.is_none() {
            link.rel = Some(config.blank_target_rel.clone());
        }

        if selection.is_collapsed() {
            let Some((block, offset)) = locate(doc, &selection.focus) else {
                return MutationResult::skipped();
            };
            let label = text.unwrap_or(link.url.as_str()).to_string();
            let label_len = char_len(&label);
            let inserted = edit_block(doc, &block, |runs| {
                unlink_range(runs, offset, offset);
                insert_at(
                    runs,
                    offset,
                    Run {
                        text: label,
                        marks: Marks::default(),
                        link: Some(link),
                    },
                );
                true
            });
            if !inserted {
                return MutationResult::skipped();
            }
            let caret = block_point(doc, &block, offset + label_len).unwrap_or_else(|| selection.focus.clone());
            return MutationResult::applied(Some(Selection::collapsed(caret)));
        }

        let end = locate(doc, selection.end());
        let mut changed = false;
        for range in block_ranges(doc, selection) {
            if range.is_empty() {
                continue;
            }
            changed |= edit_block(doc, &range.path, |runs| {
                unlink_range(runs, range.start, range.end);
                edit_range(runs, range.start, range.end, |run| run.link = Some(link.clone()));
                true
            });
        }
        if !changed {
            return MutationResult::skipped();
        }

        let caret = carry(doc, end, selection.end());
        MutationResult::applied(Some(Selection::collapsed(caret)))
    }

    fn apply_remove_link(doc: &mut Document, selection: &Selection) -> MutationResult {
        let anchor = locate(doc, &selection.anchor);
        let focus = locate(doc, &selection.focus);

        let mut changed = false;
        for range in block_ranges(doc, selection) {
            changed |= edit_block(doc, &range.path, |runs| unlink_range(runs, range.start, range.end));
        }
        if !changed {
            return MutationResult::skipped();
        }
        MutationResult::applied(Some(carry_selection(doc, selection, anchor, focus)))
    }

    fn apply_replace_all(doc: &mut Document, needle: &str, replacement: &str) -> MutationResult {
        if needle.is_empty() {
            return MutationResult::skipped();
        }
        let mut replacer = Replacer {
            needle,
            replacement,
            count: 0,
        };
        replacer.visit_document_mut(doc);
        debug!(needle, count = replacer.count, "replaced matches");
        if replacer.count == 0 {
            MutationResult::skipped()
        } else {
            MutationResult::applied(None)
        }
    }
}

/// Apply `mutation` to an owned document and normalize the result
///
/// The functional counterpart of [`crate::Editor::apply`], for hosts that
/// keep their own document state.
pub fn apply_mutation(
    mut doc: Document,
    selection: Option<&Selection>,
    mutation: &Mutation,
    config: &EditorConfig,
) -> (Document, MutationResult) {
    let result = mutation.apply(&mut doc, selection, config);
    if result.applied {
        Normalizer::new()
            .with_max_passes(config.max_normalize_passes)
            .normalize_in_place(&mut doc);
    }
    (doc, result)
}

struct Replacer<'a> {
    needle: &'a str,
    replacement: &'a str,
    count: usize,
}

impl VisitorMut for Replacer<'_> {
    fn visit_text_mut(&mut self, text: &mut Text) {
        let found = text.text.matches(self.needle).count();
        if found > 0 {
            text.text = text.text.replace(self.needle, self.replacement);
            self.count += found;
        }
    }
}

/// Flatten the block at `path`, let `edit` change its runs, and rebuild it
///
/// Returns whether the block was rewritten. Blocks holding anything other
/// than text and links are left alone.
fn edit_block(doc: &mut Document, path: &[usize], edit: impl FnOnce(&mut Vec<Run>) -> bool) -> bool {
    let Some(mut runs) = doc
        .get(path)
        .and_then(Node::as_element)
        .and_then(|el| flatten(&el.children))
    else {
        return false;
    };
    if !edit(&mut runs) {
        return false;
    }
    replace_block_children(doc, path, rebuild(runs));
    true
}

fn block_point(doc: &Document, block: &[usize], offset: usize) -> Option<Point> {
    let el = doc.get(block)?.as_element()?;
    Some(point_at(&el.children, block, offset))
}

/// Re-express a located point against the edited tree
fn carry(doc: &Document, located: Option<(Vec<usize>, usize)>, original: &Point) -> Point {
    located
        .and_then(|(block, offset)| block_point(doc, &block, offset))
        .unwrap_or_else(|| original.clone())
}

fn carry_selection(
    doc: &Document,
    selection: &Selection,
    anchor: Option<(Vec<usize>, usize)>,
    focus: Option<(Vec<usize>, usize)>,
) -> Selection {
    Selection::new(
        carry(doc, anchor, &selection.anchor),
        carry(doc, focus, &selection.focus),
    )
}
