//! Minimal in-memory DOM: an arena tree, a markup loader and a serializer.

pub mod document;
pub mod markup;
pub mod serialize;

pub use document::{Attribute, Descendants, Document, ElementData, NodeId, NodeKind};
pub use markup::{MarkupError, decode_entities};
