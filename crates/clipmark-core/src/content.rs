//! The script that runs inside every frame of a page.

use crate::codec::decode_range;
use crate::convert::{ContentFormat, convert};
use crate::frame::{FrameId, FramePosition, Page, accepts, encode_frame_selection};
use crate::highlight::{HighlightController, HighlightOptions, StaticViewport, Viewport};
use clipmark_common::SelectionInfo;
use clipmark_common::protocol::{FrameMessage, PageMessage, RuntimeMessage, SaveRequest, TextResponse};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-frame feature flags, mirrored from persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSettings {
    pub floating_button: bool,
    pub copy_html: bool,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            floating_button: true,
            copy_html: false,
        }
    }
}

/// What a capture produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// Top frame: a save request for the background.
    Runtime(RuntimeMessage),
    /// Nested frame: the request was posted to the top window.
    PostedToTop,
}

pub struct ContentScript<V: Viewport = StaticViewport> {
    frame: FrameId,
    highlighter: HighlightController,
    viewport: V,
    settings: ContentSettings,
    button_visible: bool,
    scroll: bool,
}

impl<V: Viewport> ContentScript<V> {
    pub fn new(frame: FrameId, settings: ContentSettings, viewport: V) -> Self {
        Self {
            frame,
            highlighter: HighlightController::new(),
            viewport,
            settings,
            button_visible: false,
            scroll: true,
        }
    }

    pub fn with_highlighter(mut self, highlighter: HighlightController, scroll: bool) -> Self {
        self.highlighter = highlighter;
        self.scroll = scroll;
        self
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn settings(&self) -> ContentSettings {
        self.settings
    }

    pub fn highlighter(&self) -> &HighlightController {
        &self.highlighter
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn button_visible(&self) -> bool {
        self.button_visible
    }

    /// Handle one broadcast request. Only `get_selected_text` answers, and
    /// only when this frame could rebuild the range.
    pub fn handle(&mut self, page: &mut Page, message: &PageMessage, now: Instant) -> Option<TextResponse> {
        if message.is_setting() {
            self.apply_setting(message);
            return None;
        }

        let position = FramePosition::of(page, self.frame);
        if !accepts(&position, message.frame_selector()) {
            debug!("Frame {:?} skips {}", self.frame, message.kind());
            return None;
        }

        match message {
            PageMessage::HighlightSelector(req) => {
                if req.selector.is_empty() {
                    warn!("No selector provided for highlight");
                    return None;
                }
                let options = HighlightOptions {
                    scroll: self.scroll,
                    temporary: req.temporary,
                };
                let doc = page.document_mut(self.frame);
                self.highlighter
                    .highlight(doc, &mut self.viewport, &req.selector, options, now);
                None
            }
            PageMessage::RemoveHighlight(_) => {
                self.highlighter.remove(page.document_mut(self.frame));
                None
            }
            PageMessage::SelectContent(info) => {
                self.select(page, info);
                None
            }
            PageMessage::GetSelectedText(info) => self.selected_text(page, info),
            PageMessage::UpdateEnableFloatingBtn(_) | PageMessage::UpdateCopyHtmlContent(_) => None,
        }
    }

    fn apply_setting(&mut self, message: &PageMessage) {
        match message {
            PageMessage::UpdateEnableFloatingBtn(toggle) => {
                self.settings.floating_button = toggle.enabled;
                if !toggle.enabled {
                    self.button_visible = false;
                }
            }
            PageMessage::UpdateCopyHtmlContent(toggle) => self.settings.copy_html = toggle.enabled,
            _ => {}
        }
    }

    fn select(&mut self, page: &mut Page, info: &SelectionInfo) -> bool {
        let found = decode_range(page.document_mut(self.frame), info).is_some();
        self.on_selection_change(page);
        found
    }

    fn selected_text(&mut self, page: &mut Page, info: &SelectionInfo) -> Option<TextResponse> {
        let doc = page.document_mut(self.frame);
        let range = decode_range(doc, info)?;
        let fragment = range.clone_contents(doc);
        let text = convert(&fragment, ContentFormat::from_copy_html(self.settings.copy_html))
            .trim()
            .to_string();
        doc.clear_selection();
        self.on_selection_change(page);
        debug!("Selected text: {}...", text.chars().take(10).collect::<String>());
        Some(TextResponse { text })
    }

    /// Show the floating button while a non-empty selection exists.
    pub fn on_selection_change(&mut self, page: &Page) {
        let selected = page
            .document(self.frame)
            .selection()
            .is_some_and(|r| !r.is_collapsed());
        self.button_visible = self.settings.floating_button && selected;
    }

    /// The floating button's click: encode the current selection and send it
    /// towards storage. Nothing happens while the button is disabled.
    pub fn capture(&mut self, page: &mut Page, created_at: u64) -> Option<Capture> {
        if !self.settings.floating_button {
            debug!("Floating button disabled in frame {:?}", self.frame);
            return None;
        }
        let selection = encode_frame_selection(page, self.frame)?;
        let doc = page.document(self.frame);
        let text = doc
            .selection()
            .map(|range| convert(&range.clone_contents(doc), ContentFormat::Markdown).trim().to_string())
            .filter(|t| !t.is_empty());

        let capture = if page.is_nested(self.frame) {
            let data = SaveRequest {
                selection,
                text,
                url: Some(page.top_url().to_string()),
                created_at,
            };
            page.post_to_top(FrameMessage::FrameSaveSelectedText { data });
            Capture::PostedToTop
        } else {
            let data = SaveRequest {
                selection,
                text,
                url: Some(page.url(self.frame).to_string()),
                created_at,
            };
            Capture::Runtime(RuntimeMessage::SaveSelectedText { data })
        };
        info!("Captured selection in frame {:?}", self.frame);

        self.button_visible = false;
        Some(capture)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.highlighter.next_deadline()
    }

    pub fn expire(&mut self, page: &mut Page, now: Instant) -> bool {
        self.highlighter.expire(page.document_mut(self.frame), now)
    }
}
