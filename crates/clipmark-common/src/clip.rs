use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes an optional string, treating blank values as absent.
///
/// Edit forms and clipboard cards write `frameSelector: ""` for top-level
/// clips, which must mean the same thing as a missing field.
fn deserialize_non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Portable location of a text range: a pair of `(selector, offset)`
/// boundaries, optionally scoped to an iframe of the top document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInfo {
    pub start_selector: String,
    #[serde(default)]
    pub start_offset: u32,
    pub end_selector: String,
    #[serde(default)]
    pub end_offset: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_non_blank"
    )]
    pub frame_selector: Option<String>,
}

impl SelectionInfo {
    pub fn new(
        start_selector: impl Into<String>,
        start_offset: u32,
        end_selector: impl Into<String>,
        end_offset: u32,
    ) -> Self {
        Self {
            start_selector: start_selector.into(),
            start_offset,
            end_selector: end_selector.into(),
            end_offset,
            frame_selector: None,
        }
    }

    pub fn in_frame(mut self, frame_selector: impl Into<String>) -> Self {
        self.frame_selector = Some(frame_selector.into());
        self
    }
}

/// A persisted saved range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Empty only for records imported without an id; the store assigns one.
    #[serde(default)]
    pub id: String,
    pub start_selector: String,
    #[serde(default)]
    pub start_offset: u32,
    pub end_selector: String,
    #[serde(default)]
    pub end_offset: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_non_blank"
    )]
    pub frame_selector: Option<String>,
    /// Snapshot taken at save time. Not refreshed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Epoch seconds.
    #[serde(default)]
    pub created_at: u64,
}

impl Clip {
    pub fn from_selection(id: impl Into<String>, selection: SelectionInfo, created_at: u64) -> Self {
        Self {
            id: id.into(),
            start_selector: selection.start_selector,
            start_offset: selection.start_offset,
            end_selector: selection.end_selector,
            end_offset: selection.end_offset,
            frame_selector: selection.frame_selector,
            text: None,
            created_at,
        }
    }

    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }

    /// The boundaries of this clip, as sent in `select_content` requests.
    pub fn selection(&self) -> SelectionInfo {
        SelectionInfo {
            start_selector: self.start_selector.clone(),
            start_offset: self.start_offset,
            end_selector: self.end_selector.clone(),
            end_offset: self.end_offset,
            frame_selector: self.frame_selector.clone(),
        }
    }
}

/// Normalize a page URL into the storage grouping key: fragment and query
/// are dropped, then a single trailing slash.
///
/// Input that normalizes to nothing is returned unchanged.
pub fn base_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let base = without_query.strip_suffix('/').unwrap_or(without_query);
    if base.is_empty() {
        url.to_string()
    } else {
        base.to_string()
    }
}
