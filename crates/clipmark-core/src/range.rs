//! Live ranges over a [`Document`].
//!
//! Boundary offsets follow DOM rules: UTF-16 code units inside character
//! data, child indices inside everything else.

use crate::dom::{Document, NodeId, NodeKind};
use crate::dom::document::TreeOrder;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Offset {offset} is larger than the node's length ({length})")]
    IndexSize { offset: u32, length: u32 },

    #[error("Boundary node is not connected to the document")]
    Detached,

    #[error("A doctype cannot hold a range boundary")]
    InvalidNodeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: u32,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: u32) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

/// Total order over boundary points: preorder position, then offset inside
/// character data.
type Key = (usize, u32);

impl Range {
    /// A collapsed range at `(node, offset)`.
    pub fn collapsed(doc: &Document, node: NodeId, offset: u32) -> Result<Self, RangeError> {
        check_boundary(doc, node, offset)?;
        let point = BoundaryPoint::new(node, offset);
        Ok(Self {
            start: point,
            end: point,
        })
    }

    pub fn new(doc: &Document, start: BoundaryPoint, end: BoundaryPoint) -> Result<Self, RangeError> {
        let mut range = Self::collapsed(doc, start.node, start.offset)?;
        range.set_end(doc, end.node, end.offset)?;
        Ok(range)
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    /// Move the start. A start after the current end collapses the range
    /// onto the new start.
    pub fn set_start(&mut self, doc: &Document, node: NodeId, offset: u32) -> Result<(), RangeError> {
        check_boundary(doc, node, offset)?;
        self.start = BoundaryPoint::new(node, offset);
        let order = doc.tree_order();
        if key(doc, &order, self.start) > key(doc, &order, self.end) {
            self.end = self.start;
        }
        Ok(())
    }

    /// Move the end. An end before the current start collapses the range
    /// onto the new end.
    pub fn set_end(&mut self, doc: &Document, node: NodeId, offset: u32) -> Result<(), RangeError> {
        check_boundary(doc, node, offset)?;
        self.end = BoundaryPoint::new(node, offset);
        let order = doc.tree_order();
        if key(doc, &order, self.end) < key(doc, &order, self.start) {
            self.start = self.end;
        }
        Ok(())
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundaries.
    pub fn common_ancestor(&self, doc: &Document) -> NodeId {
        let start_chain: HashSet<NodeId> = std::iter::once(self.start.node)
            .chain(doc.ancestors(self.start.node))
            .collect();
        std::iter::once(self.end.node)
            .chain(doc.ancestors(self.end.node))
            .find(|n| start_chain.contains(n))
            .unwrap_or_else(|| doc.root())
    }

    /// Concatenated text data inside the range (`Range.toString`).
    pub fn to_text(&self, doc: &Document) -> String {
        let order = doc.tree_order();
        let (Some(sk), Some(ek)) = (key(doc, &order, self.start), key(doc, &order, self.end)) else {
            return String::new();
        };

        let ancestor = self.common_ancestor(doc);
        std::iter::once(ancestor)
            .chain(doc.descendants(ancestor))
            .filter_map(|n| {
                let text = doc.text(n)?;
                let (lo, hi) = segment(doc, &order, n, sk, ek)?;
                Some(utf16_slice(text, lo, hi))
            })
            .collect()
    }

    /// Copy of the range's contents as a fragment document
    /// (`Range.cloneContents`). Partially selected elements are cloned
    /// without their unselected children; character data is cut at the
    /// boundaries.
    pub fn clone_contents(&self, doc: &Document) -> Document {
        let mut fragment = Document::new();
        let order = doc.tree_order();
        let (Some(sk), Some(ek)) = (key(doc, &order, self.start), key(doc, &order, self.end)) else {
            return fragment;
        };

        let ancestor = self.common_ancestor(doc);
        let root = fragment.root();
        if matches!(doc.kind(ancestor), NodeKind::Text(_) | NodeKind::Comment(_)) {
            copy_node(doc, &order, ancestor, sk, ek, &mut fragment, root);
        } else {
            for child in doc.children(ancestor) {
                copy_node(doc, &order, *child, sk, ek, &mut fragment, root);
            }
        }
        fragment
    }
}

fn check_boundary(doc: &Document, node: NodeId, offset: u32) -> Result<(), RangeError> {
    if matches!(doc.kind(node), NodeKind::Doctype(_)) {
        return Err(RangeError::InvalidNodeType);
    }
    if !doc.is_connected(node) {
        return Err(RangeError::Detached);
    }
    let length = doc.node_length(node);
    if offset > length {
        return Err(RangeError::IndexSize { offset, length });
    }
    Ok(())
}

fn key(doc: &Document, order: &TreeOrder, point: BoundaryPoint) -> Option<Key> {
    match doc.kind(point.node) {
        NodeKind::Text(_) | NodeKind::Comment(_) => Some((order.preorder(point.node)?, point.offset)),
        _ => match doc.children(point.node).get(point.offset as usize) {
            Some(child) => Some((order.preorder(*child)?, 0)),
            None => Some((order.subtree_end(point.node)?, 0)),
        },
    }
}

/// Selected UTF-16 span of a character data node, if non-empty.
fn segment(doc: &Document, order: &TreeOrder, node: NodeId, sk: Key, ek: Key) -> Option<(u32, u32)> {
    let pos = order.preorder(node)?;
    let length = doc.node_length(node);
    let lo = match sk.0.cmp(&pos) {
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Equal => sk.1.min(length),
        std::cmp::Ordering::Greater => return None,
    };
    let hi = match ek.0.cmp(&pos) {
        std::cmp::Ordering::Greater => length,
        std::cmp::Ordering::Equal => ek.1.min(length),
        std::cmp::Ordering::Less => return None,
    };
    (lo < hi).then_some((lo, hi))
}

fn copy_node(
    doc: &Document,
    order: &TreeOrder,
    node: NodeId,
    sk: Key,
    ek: Key,
    out: &mut Document,
    parent: NodeId,
) {
    match doc.kind(node) {
        NodeKind::Text(text) => {
            if let Some((lo, hi)) = segment(doc, order, node, sk, ek) {
                let copy = out.create_text(utf16_slice(text, lo, hi));
                out.append_child(parent, copy);
            }
        }
        NodeKind::Comment(text) => {
            if let Some((lo, hi)) = segment(doc, order, node, sk, ek) {
                let copy = out.create_comment(utf16_slice(text, lo, hi));
                out.append_child(parent, copy);
            }
        }
        NodeKind::Element(el) => {
            let (Some(pos), Some(end)) = (order.preorder(node), order.subtree_end(node)) else {
                return;
            };
            if (pos, 0) >= ek || sk >= (end, 0) {
                return;
            }
            let copy = out.create_element(&el.name, el.attrs.clone());
            out.append_child(parent, copy);
            for child in doc.children(node) {
                copy_node(doc, order, *child, sk, ek, out, copy);
            }
        }
        NodeKind::Document | NodeKind::Doctype(_) => {}
    }
}

fn utf16_slice(text: &str, lo: u32, hi: u32) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let hi = (hi as usize).min(units.len());
    let lo = (lo as usize).min(hi);
    String::from_utf16_lossy(&units[lo..hi])
}

/// Range covering the first occurrence of `needle` inside a single
/// non-blank text node below `root`.
pub fn find_text(doc: &Document, root: NodeId, needle: &str) -> Option<Range> {
    if needle.is_empty() {
        return None;
    }
    crate::text::find_text_nodes(doc, root).iter().find_map(|node| {
        let text = doc.text(node)?;
        let byte = text.find(needle)?;
        let start = text[..byte].encode_utf16().count() as u32;
        let end = start + needle.encode_utf16().count() as u32;
        Range::new(doc, BoundaryPoint::new(node, start), BoundaryPoint::new(node, end)).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let doc = Document::parse(r#"<div id="a">Hello <b>world</b>!</div>"#).unwrap();
        let div = doc.query_selector("#a").unwrap().unwrap();
        let hello = doc.children(div)[0];
        let b = doc.children(div)[1];
        (doc, div, hello, b)
    }

    #[test]
    fn text_up_to_an_element_boundary() {
        let (doc, _, hello, b) = sample();
        let range = Range::new(&doc, BoundaryPoint::new(hello, 0), BoundaryPoint::new(b, 0)).unwrap();
        assert_eq!(range.to_text(&doc), "Hello ");
        assert!(!range.is_collapsed());
    }

    #[test]
    fn text_across_nested_elements() {
        let (doc, div, hello, b) = sample();
        let world = doc.children(b)[0];
        let range = Range::new(&doc, BoundaryPoint::new(hello, 2), BoundaryPoint::new(world, 3)).unwrap();
        assert_eq!(range.to_text(&doc), "llo wor");

        let whole = Range::new(&doc, BoundaryPoint::new(div, 0), BoundaryPoint::new(div, 3)).unwrap();
        assert_eq!(whole.to_text(&doc), "Hello world!");
    }

    #[test]
    fn end_before_start_collapses() {
        let (doc, _, hello, b) = sample();
        let world = doc.children(b)[0];
        let mut range = Range::collapsed(&doc, world, 2).unwrap();
        range.set_end(&doc, hello, 1).unwrap();
        assert!(range.is_collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(hello, 1));
    }

    #[test]
    fn offsets_are_bounded_by_node_length() {
        let (doc, div, hello, _) = sample();
        assert_eq!(
            Range::collapsed(&doc, hello, 7),
            Err(RangeError::IndexSize { offset: 7, length: 6 })
        );
        assert!(Range::collapsed(&doc, div, 4).is_err());
    }

    #[test]
    fn detached_nodes_are_rejected() {
        let (mut doc, _, _, b) = sample();
        doc.detach(b);
        assert_eq!(Range::collapsed(&doc, b, 0), Err(RangeError::Detached));
    }

    #[test]
    fn clone_contents_keeps_partial_ancestors() {
        let (doc, _, hello, b) = sample();
        let world = doc.children(b)[0];
        let range = Range::new(&doc, BoundaryPoint::new(hello, 3), BoundaryPoint::new(world, 2)).unwrap();
        let fragment = range.clone_contents(&doc);
        assert_eq!(fragment.inner_html(fragment.root()), "lo <b>wo</b>");
    }

    #[test]
    fn clone_inside_one_text_node() {
        let (doc, _, hello, _) = sample();
        let range = Range::new(&doc, BoundaryPoint::new(hello, 1), BoundaryPoint::new(hello, 4)).unwrap();
        let fragment = range.clone_contents(&doc);
        assert_eq!(fragment.inner_html(fragment.root()), "ell");
    }

    #[test]
    fn find_text_uses_utf16_offsets() {
        let doc = Document::parse("<p>😀 smile</p>").unwrap();
        let body = doc.body().unwrap();
        let range = find_text(&doc, body, "smile").unwrap();
        assert_eq!(range.start().offset, 3);
        assert_eq!(range.end().offset, 8);
        assert_eq!(range.to_text(&doc), "smile");
    }
}
