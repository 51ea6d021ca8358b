use super::escape::css_escape;
use super::resolver::SelectorResolver;
use crate::dom::{Document, NodeId, NodeKind};
use crate::highlight::HIGHLIGHT_CLASS;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    /// Classes that only reflect transient UI state or framework internals.
    static ref TRANSIENT_CLASS: Regex =
        Regex::new(r"^(active|selected|hover|focus|show|hide|open|close|ng-|v-)").unwrap();
}

fn stable_classes(doc: &Document, el: NodeId) -> Vec<String> {
    doc.classes(el)
        .into_iter()
        .filter(|c| *c != HIGHLIGHT_CLASS && !TRANSIENT_CLASS.is_match(c))
        .map(css_escape)
        .collect()
}

/// `tag.class1.class2` for an element, without transient classes.
pub fn build_selector(doc: &Document, el: NodeId) -> String {
    let mut selector = doc.tag_name(el).unwrap_or("*").to_string();
    for class in stable_classes(doc, el) {
        selector.push('.');
        selector.push_str(&class);
    }
    selector
}

/// Most specific selector that uniquely resolves to the node's element.
///
/// Text and comment nodes resolve via their parent. The body is always
/// `body`. Returns `None` for the document node itself or when no ancestor
/// path can be built.
pub fn node_selector(doc: &Document, node: NodeId) -> Option<String> {
    let element = match doc.kind(node) {
        NodeKind::Element(_) => node,
        NodeKind::Text(_) | NodeKind::Comment(_) => doc.parent(node)?,
        NodeKind::Document | NodeKind::Doctype(_) => return None,
    };
    if !doc.is_element(element) {
        return None;
    }
    if Some(element) == doc.body() {
        return Some("body".to_string());
    }

    if let Some(id) = doc.element_id(element) {
        let selector = format!("#{}", css_escape(id));
        if doc.validate(&selector, element) {
            return Some(selector);
        }
        debug!("Id selector '{}' is not unique", selector);
    }

    if doc.tag_name(element) == Some("iframe") {
        if let Some(selector) = iframe_selector(doc, element) {
            return Some(selector);
        }
    }

    let selector = build_selector(doc, element);
    if doc.validate(&selector, element) {
        return Some(selector);
    }

    debug!("Falling back to positional path for '{}'", selector);
    positional_path(doc, element)
}

fn iframe_selector(doc: &Document, frame: NodeId) -> Option<String> {
    let classes = stable_classes(doc, frame);
    if !classes.is_empty() {
        let selector = format!("iframe.{}", classes.join("."));
        if doc.validate(&selector, frame) {
            return Some(selector);
        }
    }

    let name = doc.attr(frame, "name").filter(|n| !n.is_empty())?;
    let generated = name.starts_with("frame_") || name.starts_with(|c: char| c.is_ascii_digit());
    if generated {
        return None;
    }
    let selector = format!("iframe[name=\"{}\"]", css_escape(name));
    doc.validate(&selector, frame).then_some(selector)
}

/// `a > b:nth-of-type(2) > c` from below the body down to `element`,
/// anchored as `body > ...` when the short form matches elsewhere too.
fn positional_path(doc: &Document, element: NodeId) -> Option<String> {
    if !doc.is_connected(element) {
        return None;
    }
    let body = doc.body();
    let mut path = Vec::new();
    let mut current = element;

    let anchor = loop {
        if Some(current) == body {
            break "body".to_string();
        }
        let Some(parent) = doc.parent_element(current) else {
            break build_selector(doc, current);
        };
        let tag = doc.tag_name(current);
        let same_tag: Vec<NodeId> = doc
            .element_children(parent)
            .filter(|s| doc.tag_name(*s) == tag)
            .collect();

        let segment = build_selector(doc, current);
        if same_tag.len() > 1 {
            let index = same_tag.iter().position(|s| *s == current).unwrap_or(0) + 1;
            path.push(format!("{}:nth-of-type({})", segment, index));
        } else {
            path.push(segment);
        }
        current = parent;
    };

    path.reverse();
    if !path.is_empty() {
        let short = path.join(" > ");
        if doc.validate(&short, element) {
            return Some(short);
        }
        debug!("Path '{}' is ambiguous, anchoring it", short);
    }

    path.insert(0, anchor);
    let anchored = path.join(" > ");
    doc.validate(&anchored, element).then_some(anchored)
}
