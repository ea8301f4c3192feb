//! # xmledit model
//!
//! The document tree shared by the codec and the editor.
//!
//! A [`Document`] is an ordered sequence of [`Node`]s. A node is either a
//! [`Text`] leaf with independent formatting [`Marks`], or an [`Element`]
//! whose [`ElementKind`] carries the tag-specific attributes.
//!
//! Structural classification (void, inline, text-bearing) lives on [`Tag`]
//! so that every consumer asks the same predicate.

pub mod ast;
pub mod tag;
pub mod visitor;

pub use ast::*;
pub use tag::{Tag, TagSpec, REGISTRY};
pub use visitor::{NodeCounter, Visitor, VisitorMut};
