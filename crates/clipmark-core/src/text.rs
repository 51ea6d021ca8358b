//! Locating the non-blank text nodes that ranges are anchored to.

use crate::dom::{Descendants, Document, NodeId, NodeKind};

/// Non-blank text descendants of `root` in document order.
///
/// A view rather than a collected list: every call to [`TextNodes::iter`]
/// starts a fresh walk.
#[derive(Clone, Copy)]
pub struct TextNodes<'a> {
    doc: &'a Document,
    root: NodeId,
}

impl<'a> TextNodes<'a> {
    pub fn iter(&self) -> TextNodeIter<'a> {
        TextNodeIter {
            doc: self.doc,
            inner: self.doc.descendants(self.root),
        }
    }

    pub fn first(&self) -> Option<NodeId> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.iter().last()
    }
}

impl<'a> IntoIterator for TextNodes<'a> {
    type Item = NodeId;
    type IntoIter = TextNodeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone)]
pub struct TextNodeIter<'a> {
    doc: &'a Document,
    inner: Descendants<'a>,
}

impl Iterator for TextNodeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let doc = self.doc;
        self.inner.by_ref().find(|n| is_non_blank_text(doc, *n))
    }
}

fn is_non_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.text(node).is_some_and(|t| !t.trim().is_empty())
}

pub fn find_text_nodes(doc: &Document, root: NodeId) -> TextNodes<'_> {
    TextNodes { doc, root }
}

/// The node itself if it is non-blank text, else the first text node below
/// an element.
pub fn first_text_node(doc: &Document, node: NodeId) -> Option<NodeId> {
    match doc.kind(node) {
        NodeKind::Text(_) => is_non_blank_text(doc, node).then_some(node),
        NodeKind::Element(_) => find_text_nodes(doc, node).first(),
        _ => None,
    }
}

pub fn last_text_node(doc: &Document, node: NodeId) -> Option<NodeId> {
    match doc.kind(node) {
        NodeKind::Text(_) => is_non_blank_text(doc, node).then_some(node),
        NodeKind::Element(_) => find_text_nodes(doc, node).last(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_whitespace_only_nodes() {
        let doc = Document::parse("<ul>\n  <li>a</li>\n  <li> <b>b</b> </li>\n</ul>").unwrap();
        let ul = doc.query_selector("ul").unwrap().unwrap();
        let texts: Vec<_> = find_text_nodes(&doc, ul)
            .into_iter()
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn view_is_restartable() {
        let doc = Document::parse("<p>x<i>y</i>z</p>").unwrap();
        let p = doc.query_selector("p").unwrap().unwrap();
        let nodes = find_text_nodes(&doc, p);
        assert_eq!(nodes.iter().count(), 3);
        assert_eq!(nodes.iter().count(), 3);
        assert_eq!(doc.text(nodes.first().unwrap()), Some("x"));
        assert_eq!(doc.text(nodes.last().unwrap()), Some("z"));
    }

    #[test]
    fn first_and_last_by_node_kind() {
        let doc = Document::parse("<p> <!-- c --> </p><div>t</div>").unwrap();
        let p = doc.query_selector("p").unwrap().unwrap();
        assert_eq!(first_text_node(&doc, p), None);

        let blank = doc.children(p)[0];
        assert_eq!(first_text_node(&doc, blank), None);
        let comment = doc.children(p)[1];
        assert_eq!(last_text_node(&doc, comment), None);

        let div = doc.query_selector("div").unwrap().unwrap();
        let t = doc.children(div)[0];
        assert_eq!(first_text_node(&doc, t), Some(t));
        assert_eq!(last_text_node(&doc, div), Some(t));
    }
}
