//! A browser tab: one page and one content script per frame.

use crate::content::{Capture, ContentScript, ContentSettings};
use crate::dom::Document;
use crate::frame::{FrameError, FrameId, Page, forward_to_background};
use crate::highlight::{HighlightController, StaticViewport, Viewport};
use clipmark_common::protocol::{PageMessage, RuntimeMessage, TextResponse};
use std::time::{Duration, Instant};
use tracing::debug;

/// Highlight behaviour shared by every frame of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSettings {
    pub temporary: Duration,
    pub scroll: bool,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            temporary: crate::highlight::TEMPORARY_HIGHLIGHT,
            scroll: true,
        }
    }
}

pub struct Tab<V: Viewport = StaticViewport> {
    page: Page,
    scripts: Vec<ContentScript<V>>,
    settings: ContentSettings,
    highlight: HighlightSettings,
}

impl<V: Viewport + Default> Tab<V> {
    /// Inject a content script into every frame already loaded in `page`.
    pub fn new(page: Page, settings: ContentSettings, highlight: HighlightSettings) -> Self {
        let mut tab = Self {
            page,
            scripts: Vec::new(),
            settings,
            highlight,
        };
        let frames: Vec<FrameId> = tab.page.frame_ids().collect();
        for frame in frames {
            tab.inject(frame);
        }
        tab
    }

    /// Load a document into an iframe and inject a content script into it.
    pub fn attach_frame(
        &mut self,
        parent: FrameId,
        iframe_selector: &str,
        document: Document,
        url: &str,
    ) -> Result<FrameId, FrameError> {
        let frame = self.page.attach_frame(parent, iframe_selector, document, url)?;
        self.inject(frame);
        Ok(frame)
    }

    fn inject(&mut self, frame: FrameId) {
        let highlighter = HighlightController::with_duration(self.highlight.temporary);
        self.scripts.push(
            ContentScript::new(frame, self.settings, V::default())
                .with_highlighter(highlighter, self.highlight.scroll),
        );
    }
}

impl<V: Viewport> Tab<V> {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn script(&self, frame: FrameId) -> Option<&ContentScript<V>> {
        self.scripts.iter().find(|s| s.frame() == frame)
    }

    pub fn script_mut(&mut self, frame: FrameId) -> Option<&mut ContentScript<V>> {
        self.scripts.iter_mut().find(|s| s.frame() == frame)
    }

    /// Broadcast a request to every frame and collect the answers.
    pub fn dispatch(&mut self, message: &PageMessage, now: Instant) -> Vec<TextResponse> {
        debug!("Dispatching {} to {} frame(s)", message.kind(), self.scripts.len());
        self.scripts
            .iter_mut()
            .filter_map(|script| script.handle(&mut self.page, message, now))
            .collect()
    }

    /// Click the floating button in `frame`. Returns every save request that
    /// reached the background, including ones relayed through the top frame.
    pub fn capture(&mut self, frame: FrameId, created_at: u64) -> Vec<RuntimeMessage> {
        let Some(script) = self.scripts.iter_mut().find(|s| s.frame() == frame) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(Capture::Runtime(message)) = script.capture(&mut self.page, created_at) {
            out.push(message);
        }
        out.extend(self.drain_frame_messages());
        out
    }

    /// The top window's listener for posts from nested frames.
    pub fn drain_frame_messages(&mut self) -> Vec<RuntimeMessage> {
        let top_url = self.page.top_url().clone();
        self.page
            .take_top_messages()
            .into_iter()
            .map(|message| forward_to_background(&top_url, message))
            .collect()
    }

    /// Earliest pending temporary-highlight removal across all frames.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scripts.iter().filter_map(|s| s.next_deadline()).min()
    }

    pub fn expire(&mut self, now: Instant) {
        for script in &mut self.scripts {
            script.expire(&mut self.page, now);
        }
    }
}
