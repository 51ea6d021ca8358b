use crate::clip::SelectionInfo;
use serde::{Deserialize, Serialize};

/// Requests broadcast from the privileged UI (popup, options) to every frame
/// of the active tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageMessage {
    HighlightSelector(HighlightRequest),
    RemoveHighlight(RemoveHighlightRequest),
    SelectContent(SelectionInfo),
    GetSelectedText(SelectionInfo),
    UpdateEnableFloatingBtn(ToggleRequest),
    UpdateCopyHtmlContent(ToggleRequest),
}

impl PageMessage {
    /// The frame a request is scoped to, `None` for the top document.
    pub fn frame_selector(&self) -> Option<&str> {
        match self {
            PageMessage::HighlightSelector(req) => req.frame_selector.as_deref(),
            PageMessage::RemoveHighlight(req) => req.frame_selector.as_deref(),
            PageMessage::SelectContent(sel) | PageMessage::GetSelectedText(sel) => {
                sel.frame_selector.as_deref()
            }
            PageMessage::UpdateEnableFloatingBtn(_) | PageMessage::UpdateCopyHtmlContent(_) => None,
        }
    }

    /// Settings updates apply to every frame regardless of scope.
    pub fn is_setting(&self) -> bool {
        matches!(
            self,
            PageMessage::UpdateEnableFloatingBtn(_) | PageMessage::UpdateCopyHtmlContent(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PageMessage::HighlightSelector(_) => "highlight_selector",
            PageMessage::RemoveHighlight(_) => "remove_highlight",
            PageMessage::SelectContent(_) => "select_content",
            PageMessage::GetSelectedText(_) => "get_selected_text",
            PageMessage::UpdateEnableFloatingBtn(_) => "update_enable_floating_btn",
            PageMessage::UpdateCopyHtmlContent(_) => "update_copy_html_content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRequest {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_selector: Option<String>,
    /// Drop the highlight again after a short delay.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveHighlightRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_selector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Reply to `get_selected_text`. Frames that cannot resolve the range send
/// nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

/// Messages handled by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeMessage {
    SaveSelectedText { data: SaveRequest },
}

/// Cross-document message posted from a nested frame to the top window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameMessage {
    FrameSaveSelectedText { data: SaveRequest },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(flatten)]
    pub selection: SelectionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Page URL. Frames leave it to the top window to stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
}
