//! Turning a cloned selection into clipboard text.

use crate::dom::{Document, NodeId, NodeKind};

/// Output format for copied selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    #[default]
    Markdown,
    Html,
}

impl ContentFormat {
    pub fn from_copy_html(copy_html: bool) -> Self {
        if copy_html {
            ContentFormat::Html
        } else {
            ContentFormat::Markdown
        }
    }
}

pub fn convert(fragment: &Document, format: ContentFormat) -> String {
    match format {
        ContentFormat::Markdown => to_markdown(fragment),
        ContentFormat::Html => to_html(fragment),
    }
}

pub fn to_html(fragment: &Document) -> String {
    fragment.inner_html(fragment.root())
}

/// Markdown rendering: links become `[text](href)`, images `![alt](src)`,
/// other elements contribute their children. Lines are trimmed and blank
/// runs collapse to one empty line.
pub fn to_markdown(fragment: &Document) -> String {
    let mut raw = String::new();
    write_markdown(fragment, fragment.root(), &mut raw);
    tidy_lines(&raw).trim().to_string()
}

fn write_markdown(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(el) if el.name == "a" => {
            let mut label = String::new();
            for child in doc.children(node) {
                write_markdown(doc, *child, &mut label);
            }
            out.push_str(&format!("[{}]({})", label, el.attr("href").unwrap_or_default()));
        }
        NodeKind::Element(el) if el.name == "img" => {
            let alt = el.attr("alt").filter(|a| !a.is_empty()).unwrap_or("image");
            out.push_str(&format!("![{}]({})", alt, el.attr("src").unwrap_or_default()));
        }
        NodeKind::Element(_) | NodeKind::Document => {
            for child in doc.children(node) {
                write_markdown(doc, *child, out);
            }
        }
        NodeKind::Comment(_) | NodeKind::Doctype(_) => {}
    }
}

fn tidy_lines(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut last_empty = false;

    for line in raw.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !last_empty {
                lines.push("");
                last_empty = true;
            }
        } else {
            lines.push(trimmed);
            last_empty = false;
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{BoundaryPoint, Range};

    fn body_fragment(markup: &str) -> Document {
        let doc = Document::parse(markup).unwrap();
        let body = doc.body().unwrap();
        let range = Range::new(
            &doc,
            BoundaryPoint::new(body, 0),
            BoundaryPoint::new(body, doc.node_length(body)),
        )
        .unwrap();
        range.clone_contents(&doc)
    }

    #[test]
    fn links_and_images() {
        let fragment = body_fragment(r#"<a href="x">t</a> <img alt="a" src="s">"#);
        assert_eq!(to_markdown(&fragment), "[t](x) ![a](s)");
    }

    #[test]
    fn image_alt_defaults() {
        let fragment = body_fragment(r#"<img src="s.png">"#);
        assert_eq!(to_markdown(&fragment), "![image](s.png)");
    }

    #[test]
    fn lines_are_trimmed_and_blank_runs_collapse() {
        let fragment = body_fragment("<div>\n   first  \n\n\n\t second\n</div>");
        assert_eq!(to_markdown(&fragment), "first\n\nsecond");
    }

    #[test]
    fn html_format_is_inner_html() {
        let fragment = body_fragment(r#"<p>a <b>b</b></p>"#);
        assert_eq!(convert(&fragment, ContentFormat::Html), "<p>a <b>b</b></p>");
        assert_eq!(ContentFormat::from_copy_html(false), ContentFormat::Markdown);
    }
}
