use super::parser::{
    AttrOp, Combinator, ComplexSelector, CompoundSelector, Condition, SelectorError, SelectorList,
    parse_selector,
};
use crate::dom::{Document, NodeId};

impl Document {
    /// All elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self
            .elements()
            .filter(|el| matches_list(self, *el, &list))
            .collect())
    }

    /// The first element in document order matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self.elements().find(|el| matches_list(self, *el, &list)))
    }
}

pub fn matches_list(doc: &Document, node: NodeId, list: &SelectorList) -> bool {
    doc.is_element(node)
        && list.selectors.iter().any(|complex| {
            !complex.compounds.is_empty()
                && matches_complex(doc, node, complex, complex.compounds.len() - 1)
        })
}

/// Right-to-left match of `complex.compounds[..=idx]` with `node` as the
/// subject of `compounds[idx]`.
fn matches_complex(doc: &Document, node: NodeId, complex: &ComplexSelector, idx: usize) -> bool {
    if !matches_compound(doc, node, &complex.compounds[idx]) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match complex.combinators[idx - 1] {
        Combinator::Child => doc
            .parent_element(node)
            .is_some_and(|p| matches_complex(doc, p, complex, idx - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .filter(|a| doc.is_element(*a))
            .any(|a| matches_complex(doc, a, complex, idx - 1)),
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &CompoundSelector) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if compound.tag.as_ref().is_some_and(|tag| *tag != element.name) {
        return false;
    }

    compound.conditions.iter().all(|cond| match cond {
        Condition::Id(id) => element.attr("id") == Some(id.as_str()),
        Condition::Class(class) => doc.has_class(node, class),
        Condition::Attribute { name, matcher } => match (element.attr(name), matcher) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some((op, expected))) => attr_matches(*op, actual, expected),
        },
        Condition::Nth {
            nth,
            of_type,
            from_end,
        } => sibling_position(doc, node, *of_type, *from_end)
            .is_some_and(|pos| nth.matches(pos)),
        Condition::Root => doc.document_element() == Some(node),
    })
}

fn attr_matches(op: AttrOp, actual: &str, expected: &str) -> bool {
    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}

/// 1-based position of `node` among its element siblings.
fn sibling_position(doc: &Document, node: NodeId, of_type: bool, from_end: bool) -> Option<i32> {
    let parent = doc.parent(node)?;
    let tag = doc.tag_name(node);
    let siblings: Vec<NodeId> = doc
        .element_children(parent)
        .filter(|s| !of_type || doc.tag_name(*s) == tag)
        .collect();
    let idx = siblings.iter().position(|s| *s == node)?;
    let pos = if from_end { siblings.len() - idx } else { idx + 1 };
    Some(pos as i32)
}

#[cfg(test)]
mod tests {
    use crate::dom::Document;

    fn doc() -> Document {
        Document::parse(
            r#"<div id="main" class="card wide">
                <p class="a">one</p>
                <span lang="en-US">two</span>
                <p class="a b">three</p>
                <p>four</p>
                <ul><li>1</li><li>2</li><li>3</li></ul>
            </div>"#,
        )
        .unwrap()
    }

    fn texts(doc: &Document, selector: &str) -> Vec<String> {
        doc.query_selector_all(selector)
            .unwrap()
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    }

    #[test]
    fn type_class_and_id() {
        let doc = doc();
        assert_eq!(texts(&doc, "p.a"), vec!["one", "three"]);
        assert_eq!(texts(&doc, "#main > .b"), vec!["three"]);
        assert_eq!(texts(&doc, "DIV#main span"), vec!["two"]);
        assert!(doc.query_selector("#Main").unwrap().is_none());
    }

    #[test]
    fn structural_pseudo_classes() {
        let doc = doc();
        assert_eq!(texts(&doc, "div > p:nth-of-type(2)"), vec!["three"]);
        assert_eq!(texts(&doc, "p:last-of-type"), vec!["four"]);
        assert_eq!(texts(&doc, "li:nth-child(odd)"), vec!["1", "3"]);
        assert_eq!(texts(&doc, "li:nth-last-child(1)"), vec!["3"]);
        assert_eq!(texts(&doc, "div > :first-child"), vec!["one"]);
        assert_eq!(doc.query_selector_all(":root").unwrap(), vec![doc.document_element().unwrap()]);
    }

    #[test]
    fn attribute_operators() {
        let doc = doc();
        assert_eq!(texts(&doc, "[lang|=en]"), vec!["two"]);
        assert_eq!(texts(&doc, "[class~=b]"), vec!["three"]);
        assert_eq!(texts(&doc, r#"[lang$="US"]"#), vec!["two"]);
        assert_eq!(doc.query_selector_all("[class^=c]").unwrap().len(), 1);
    }

    #[test]
    fn selector_lists_keep_document_order() {
        let doc = doc();
        assert_eq!(texts(&doc, "span, p.b"), vec!["two", "three"]);
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let doc = doc();
        assert!(doc.query_selector("p:hover").is_err());
        assert!(doc.query_selector_all("div >").is_err());
    }
}
