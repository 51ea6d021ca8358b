//! Selector Resolution
//!
//! Resolves selector strings against a document context. Everything that
//! builds or re-locates a selector goes through this trait, so alternative
//! document backends only need to supply `resolve_all`.

use super::parser::SelectorError;
use crate::dom::{Document, NodeId};
use tracing::debug;

/// Resolve CSS selectors to nodes of one document context.
pub trait SelectorResolver {
    /// All matches in document order, or `Err` on malformed syntax.
    fn resolve_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError>;

    /// Returns `Ok(Some(id))` for the first match, `Ok(None)` if not found.
    fn resolve_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.resolve_all(selector)?.into_iter().next())
    }

    /// True only if `selector` matches exactly one node and it is `target`.
    /// Syntax errors count as a failed validation.
    fn validate(&self, selector: &str, target: NodeId) -> bool {
        match self.resolve_all(selector) {
            Ok(found) => found.len() == 1 && found[0] == target,
            Err(e) => {
                debug!("Selector '{}' rejected: {}", selector, e);
                false
            }
        }
    }
}

impl SelectorResolver for Document {
    fn resolve_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        self.query_selector_all(selector)
    }

    fn resolve_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        self.query_selector(selector)
    }
}
