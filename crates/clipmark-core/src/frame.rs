//! Pages made of nested frames, and the routing rules between them.

use crate::codec::encode_selection;
use crate::dom::{Document, NodeId};
use crate::selector::{SelectorError, node_selector};
use clipmark_common::SelectionInfo;
use clipmark_common::protocol::{FrameMessage, RuntimeMessage};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum FrameError {
    /// The parent document belongs to another origin.
    #[error("Blocked cross-origin access to the parent of {0}")]
    CrossOrigin(Url),

    #[error("No iframe matches '{0}'")]
    FrameNotFound(String),

    #[error("Element '{0}' is not an iframe")]
    NotAFrameElement(String),

    #[error("Invalid frame URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    pub const TOP: FrameId = FrameId(0);
}

#[derive(Debug, Clone, Copy)]
struct FrameHost {
    parent: FrameId,
    element: NodeId,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub document: Document,
    pub url: Url,
    host: Option<FrameHost>,
}

/// A top document plus every iframe document loaded below it.
#[derive(Debug, Clone)]
pub struct Page {
    frames: Vec<Frame>,
    /// `postMessage` queue of the top window.
    top_inbox: Vec<FrameMessage>,
}

impl Page {
    pub fn new(url: &str, document: Document) -> Result<Self, FrameError> {
        Ok(Self {
            frames: vec![Frame {
                document,
                url: Url::parse(url)?,
                host: None,
            }],
            top_inbox: Vec::new(),
        })
    }

    /// Load `document` into the iframe matching `iframe_selector` inside
    /// `parent`.
    pub fn attach_frame(
        &mut self,
        parent: FrameId,
        iframe_selector: &str,
        document: Document,
        url: &str,
    ) -> Result<FrameId, FrameError> {
        let url = Url::parse(url)?;
        let parent_doc = &self.frame(parent).document;
        let element = parent_doc
            .query_selector(iframe_selector)?
            .ok_or_else(|| FrameError::FrameNotFound(iframe_selector.to_string()))?;
        if !matches!(parent_doc.tag_name(element), Some("iframe" | "frame")) {
            return Err(FrameError::NotAFrameElement(iframe_selector.to_string()));
        }

        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            document,
            url,
            host: Some(FrameHost { parent, element }),
        });
        debug!("Attached frame {:?} at '{}'", id, iframe_selector);
        Ok(id)
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        (0..self.frames.len()).map(FrameId)
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn document(&self, id: FrameId) -> &Document {
        &self.frames[id.0].document
    }

    pub fn document_mut(&mut self, id: FrameId) -> &mut Document {
        &mut self.frames[id.0].document
    }

    pub fn url(&self, id: FrameId) -> &Url {
        &self.frames[id.0].url
    }

    pub fn top_url(&self) -> &Url {
        self.url(FrameId::TOP)
    }

    /// `window !== window.top`
    pub fn is_nested(&self, id: FrameId) -> bool {
        self.frames[id.0].host.is_some()
    }

    /// `window.frameElement`: the hosting iframe and the frame it lives in.
    /// Reading it across origins is refused.
    pub fn frame_element(&self, id: FrameId) -> Result<Option<(FrameId, NodeId)>, FrameError> {
        let Some(host) = self.frames[id.0].host else {
            return Ok(None);
        };
        let own = self.url(id).origin();
        if own != self.url(host.parent).origin() {
            return Err(FrameError::CrossOrigin(self.url(id).clone()));
        }
        Ok(Some((host.parent, host.element)))
    }

    /// `window.top.postMessage`
    pub fn post_to_top(&mut self, message: FrameMessage) {
        self.top_inbox.push(message);
    }

    pub fn take_top_messages(&mut self) -> Vec<FrameMessage> {
        std::mem::take(&mut self.top_inbox)
    }
}

/// Selector of the iframe hosting `frame`, evaluated in its parent document.
///
/// `None` for the top frame, across origins, and whenever the selector does
/// not resolve back to the very same iframe.
pub fn frame_selector(page: &Page, frame: FrameId) -> Option<String> {
    let (parent, element) = match page.frame_element(frame) {
        Ok(Some(host)) => host,
        Ok(None) => return None,
        Err(e) => {
            debug!("No frame selector: {}", e);
            return None;
        }
    };

    let parent_doc = page.document(parent);
    let selector = node_selector(parent_doc, element)?;
    match parent_doc.query_selector(&selector) {
        Ok(Some(found)) if found == element => Some(selector),
        _ => {
            debug!("Frame selector '{}' does not resolve to its frame", selector);
            None
        }
    }
}

/// Encode the frame's current selection, scoped to its iframe when nested.
pub fn encode_frame_selection(page: &Page, frame: FrameId) -> Option<SelectionInfo> {
    let info = encode_selection(page.document(frame))?;
    if !page.is_nested(frame) {
        return Some(info);
    }
    Some(match frame_selector(page, frame) {
        Some(selector) => info.in_frame(selector),
        None => info,
    })
}

/// Where a content script runs, as far as message filtering is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePosition {
    Top,
    /// A nested frame and its own frame selector, when computable.
    Nested { selector: Option<String> },
}

impl FramePosition {
    pub fn of(page: &Page, frame: FrameId) -> Self {
        if page.is_nested(frame) {
            FramePosition::Nested {
                selector: frame_selector(page, frame),
            }
        } else {
            FramePosition::Top
        }
    }
}

/// Whether a script at `position` handles a broadcast request scoped to
/// `target`.
///
/// Unscoped requests belong to the top document, scoped ones to the nested
/// frame they name. A nested frame that cannot name itself, such as a
/// cross-origin one, handles neither.
pub fn accepts(position: &FramePosition, target: Option<&str>) -> bool {
    match (position, target) {
        (FramePosition::Top, None) => true,
        (FramePosition::Top, Some(_)) => false,
        (FramePosition::Nested { .. }, None) => false,
        (FramePosition::Nested { selector: None }, Some(_)) => false,
        (FramePosition::Nested { selector: Some(own) }, Some(target)) => own == target,
    }
}

/// Turn a frame's post into a save request carrying the top window's URL.
pub fn forward_to_background(top_url: &Url, message: FrameMessage) -> RuntimeMessage {
    match message {
        FrameMessage::FrameSaveSelectedText { mut data } => {
            data.url = Some(top_url.to_string());
            RuntimeMessage::SaveSelectedText { data }
        }
    }
}
