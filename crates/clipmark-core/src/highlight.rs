//! Visual highlighting of a single resolved element per document.

use crate::dom::{Document, NodeId};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Marker class applied to the highlighted element.
pub const HIGHLIGHT_CLASS: &str = "clipmark-highlight";

/// Lifetime of a temporary highlight.
pub const TEMPORARY_HIGHLIGHT: Duration = Duration::from_millis(2000);

/// Layout queries the controller needs from the host.
pub trait Viewport {
    /// Whether the element is rendered at all (`offsetParent !== null`).
    fn has_layout_box(&self, doc: &Document, el: NodeId) -> bool;

    fn is_in_view(&self, doc: &Document, el: NodeId) -> bool;

    /// Smooth-scroll the element to the center of the viewport.
    fn scroll_into_view(&mut self, doc: &Document, el: NodeId);
}

/// Viewport without real layout.
///
/// Elements are rendered unless they or an ancestor carry `hidden` or an
/// inline `display: none`. Everything is in view except elements marked
/// offscreen; scrolling brings an element into view and is recorded.
#[derive(Debug, Clone, Default)]
pub struct StaticViewport {
    offscreen: HashSet<NodeId>,
    scrolled: Vec<NodeId>,
}

impl StaticViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offscreen(&mut self, el: NodeId) {
        self.offscreen.insert(el);
    }

    /// Elements scrolled to, oldest first.
    pub fn scrolled(&self) -> &[NodeId] {
        &self.scrolled
    }
}

fn is_display_none(doc: &Document, el: NodeId) -> bool {
    doc.attr(el, "style").is_some_and(|style| {
        style
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .any(|(prop, value)| {
                prop.trim().eq_ignore_ascii_case("display")
                    && value.trim().to_ascii_lowercase().starts_with("none")
            })
    })
}

impl Viewport for StaticViewport {
    fn has_layout_box(&self, doc: &Document, el: NodeId) -> bool {
        std::iter::once(el)
            .chain(doc.ancestors(el))
            .filter(|n| doc.is_element(*n))
            .all(|n| doc.attr(n, "hidden").is_none() && !is_display_none(doc, n))
    }

    fn is_in_view(&self, _doc: &Document, el: NodeId) -> bool {
        !self.offscreen.contains(&el)
    }

    fn scroll_into_view(&mut self, _doc: &Document, el: NodeId) {
        self.offscreen.remove(&el);
        self.scrolled.push(el);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    pub scroll: bool,
    pub temporary: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            scroll: true,
            temporary: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    None,
    Highlighted(NodeId),
}

#[derive(Debug, Clone, Copy)]
struct PendingRemoval {
    element: NodeId,
    deadline: Instant,
}

/// Owns the "currently highlighted element" of one document.
///
/// At most one element carries [`HIGHLIGHT_CLASS`] at any time, and only
/// the most recent temporary highlight has a scheduled removal.
#[derive(Debug, Clone)]
pub struct HighlightController {
    state: HighlightState,
    pending: Option<PendingRemoval>,
    duration: Duration,
}

impl Default for HighlightController {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightController {
    pub fn new() -> Self {
        Self::with_duration(TEMPORARY_HIGHLIGHT)
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            state: HighlightState::None,
            pending: None,
            duration,
        }
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    /// Highlight the element matching `selector`.
    ///
    /// No-op for `body`, unresolved or unrendered elements, and the element
    /// that is already highlighted. Returns whether a new highlight was set.
    pub fn highlight<V: Viewport>(
        &mut self,
        doc: &mut Document,
        viewport: &mut V,
        selector: &str,
        options: HighlightOptions,
        now: Instant,
    ) -> bool {
        if selector.is_empty() || selector == "body" {
            return false;
        }

        let el = match doc.query_selector(selector) {
            Ok(Some(el)) => el,
            Ok(None) => {
                debug!("Nothing to highlight for '{}'", selector);
                return false;
            }
            Err(e) => {
                warn!("Failed to highlight element: {}", e);
                return false;
            }
        };
        if !viewport.has_layout_box(doc, el) {
            debug!("Element for '{}' is not rendered", selector);
            return false;
        }

        match self.state {
            HighlightState::Highlighted(current) if current == el => return false,
            HighlightState::Highlighted(current) => doc.remove_class(current, HIGHLIGHT_CLASS),
            HighlightState::None => {}
        }

        if options.scroll && !viewport.is_in_view(doc, el) {
            viewport.scroll_into_view(doc, el);
        }

        doc.add_class(el, HIGHLIGHT_CLASS);
        self.state = HighlightState::Highlighted(el);
        self.pending = options.temporary.then(|| PendingRemoval {
            element: el,
            deadline: now + self.duration,
        });
        true
    }

    /// Clear the highlight. Idempotent.
    pub fn remove(&mut self, doc: &mut Document) {
        if let HighlightState::Highlighted(el) = self.state {
            doc.remove_class(el, HIGHLIGHT_CLASS);
        }
        self.state = HighlightState::None;
        self.pending = None;
    }

    /// When the pending temporary highlight is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Drop a temporary highlight whose deadline has passed. Returns whether
    /// a highlight was removed.
    pub fn expire(&mut self, doc: &mut Document, now: Instant) -> bool {
        let Some(pending) = self.pending.filter(|p| p.deadline <= now) else {
            return false;
        };
        self.pending = None;

        if self.state == HighlightState::Highlighted(pending.element) {
            doc.remove_class(pending.element, HIGHLIGHT_CLASS);
            self.state = HighlightState::None;
            return true;
        }
        false
    }
}
