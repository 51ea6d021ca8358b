use super::document::{Attribute, Document, NodeId, NodeKind};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "dom/markup.pest"]
pub struct MarkupParser;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("Markup syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
}

impl Document {
    /// Load a document from markup.
    ///
    /// Fragments without a `body` are wrapped into `html > head + body`, the
    /// way a browser would build them.
    pub fn parse(markup: &str) -> Result<Document, MarkupError> {
        let mut pairs = MarkupParser::parse(Rule::document, markup).map_err(Box::new)?;
        let mut doc = Document::new();
        let root = doc.root();

        if let Some(document) = pairs.next() {
            for pair in document.into_inner() {
                build_node(&mut doc, root, pair);
            }
        }

        ensure_body(&mut doc);
        Ok(doc)
    }
}

fn build_node(doc: &mut Document, parent: NodeId, pair: Pair<Rule>) {
    match pair.as_rule() {
        Rule::comment => {
            let body = pair
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or_default();
            let node = doc.create_comment(body);
            doc.append_child(parent, node);
        }
        Rule::doctype => {
            let name = pair
                .into_inner()
                .next()
                .map(|p| p.as_str().trim().to_ascii_lowercase())
                .unwrap_or_default();
            let node = doc.create_doctype(name);
            doc.append_child(parent, node);
        }
        Rule::text => {
            let node = doc.create_text(decode_entities(pair.as_str()));
            doc.append_child(parent, node);
        }
        Rule::element | Rule::void_element | Rule::raw_element => {
            build_element(doc, parent, pair);
        }
        _ => {}
    }
}

fn build_element(doc: &mut Document, parent: NodeId, pair: Pair<Rule>) {
    let mut inner = pair.into_inner();
    let Some(name) = inner.next() else {
        return;
    };
    let attrs = inner
        .next()
        .map(|a| a.into_inner().map(build_attribute).collect())
        .unwrap_or_default();
    let element = doc.create_element(name.as_str(), attrs);
    doc.append_child(parent, element);
    let escapable = !matches!(doc.tag_name(element), Some("script" | "style"));

    for child in inner {
        match child.as_rule() {
            Rule::raw_text if !child.as_str().is_empty() => {
                let text = if escapable {
                    doc.create_text(decode_entities(child.as_str()))
                } else {
                    doc.create_text(child.as_str())
                };
                doc.append_child(element, text);
            }
            Rule::self_close | Rule::raw_text => {}
            _ => build_node(doc, element, child),
        }
    }
}

fn build_attribute(pair: Pair<Rule>) -> Attribute {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let value = inner
        .next()
        .map(|p| decode_entities(p.as_str()).into_owned())
        .unwrap_or_default();
    Attribute { name, value }
}

fn ensure_body(doc: &mut Document) {
    if doc.body().is_some() {
        return;
    }
    let root = doc.root();

    let html = match doc.document_element() {
        Some(html) if doc.tag_name(html) == Some("html") => html,
        _ => {
            let html = doc.create_element("html", vec![]);
            let head = doc.create_element("head", vec![]);
            doc.append_child(html, head);
            let content: Vec<NodeId> = doc
                .children(root)
                .iter()
                .copied()
                .filter(|n| !matches!(doc.kind(*n), NodeKind::Doctype(_)))
                .collect();
            let body = doc.create_element("body", vec![]);
            for node in content {
                doc.append_child(body, node);
            }
            doc.append_child(html, body);
            doc.append_child(root, html);
            return;
        }
    };

    let content: Vec<NodeId> = doc
        .children(html)
        .iter()
        .copied()
        .filter(|n| doc.tag_name(*n) != Some("head"))
        .collect();
    let body = doc.create_element("body", vec![]);
    for node in content {
        doc.append_child(body, node);
    }
    doc.append_child(html, body);
}

/// Decode the character references that appear in practice.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match rest.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_reference(&rest[1..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return Some(char::from_u32(code).unwrap_or('\u{FFFD}'));
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_wrapped_in_body() {
        let doc = Document::parse(r#"<div id="a">Hello <b>world</b></div>"#).unwrap();
        let body = doc.body().expect("body");
        let div = doc.element_children(body).next().unwrap();
        assert_eq!(doc.attr(div, "id"), Some("a"));
        assert_eq!(doc.text_content(div), "Hello world");
        assert!(doc.head().is_some());
    }

    #[test]
    fn full_document_keeps_its_structure() {
        let doc = Document::parse(
            "<!DOCTYPE html>\n<html><head><title>T &amp; U</title></head><body><p>x</p></body></html>",
        )
        .unwrap();
        let head = doc.head().unwrap();
        assert_eq!(doc.text_content(head), "T & U");
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "x");
    }

    #[test]
    fn void_and_self_closing_elements() {
        let doc = Document::parse(r#"<p>a<br>b<img alt="x" src=s.png/><span/></p>"#).unwrap();
        let p = doc.elements().find(|n| doc.tag_name(*n) == Some("p")).unwrap();
        let tags: Vec<_> = doc
            .element_children(p)
            .filter_map(|c| doc.tag_name(c))
            .collect();
        assert_eq!(tags, vec!["br", "img", "span"]);
    }

    #[test]
    fn attribute_forms_and_entities() {
        let doc = Document::parse(
            r#"<input disabled value='a &quot;b&quot;' data-x=1><a title="&lt;&#65;&#x42;&gt;">k</a>"#,
        )
        .unwrap();
        let input = doc.elements().find(|n| doc.tag_name(*n) == Some("input")).unwrap();
        assert_eq!(doc.attr(input, "disabled"), Some(""));
        assert_eq!(doc.attr(input, "value"), Some("a \"b\""));
        assert_eq!(doc.attr(input, "data-x"), Some("1"));
        let a = doc.elements().find(|n| doc.tag_name(*n) == Some("a")).unwrap();
        assert_eq!(doc.attr(a, "title"), Some("<AB>"));
    }

    #[test]
    fn script_content_is_raw() {
        let doc = Document::parse("<div><script>if (a < b) { x(); }</script></div>").unwrap();
        let script = doc
            .elements()
            .find(|n| doc.tag_name(*n) == Some("script"))
            .unwrap();
        assert_eq!(doc.text_content(script), "if (a < b) { x(); }");
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        assert!(Document::parse("<div><p>x</div>").is_err());
    }

    #[test]
    fn unknown_references_pass_through() {
        assert_eq!(decode_entities("a & b &bogus; &#x41;"), "a & b &bogus; A");
    }
}
