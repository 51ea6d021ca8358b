//! Clip CRUD over a [`KeyValueStore`].
//!
//! Every mutation is a whole read-modify-write of the `clips` key, serialized
//! through one writer lock.

use crate::storage::{
    CLIPS_KEY, COPY_HTML_KEY, FLOATING_BUTTON_KEY, KeyValueStore, StorageError,
};
use crate::transfer::{ClipBundle, ClipCard, ImportPayload, ImportSummary, merge_import};
use clipmark_common::protocol::SaveRequest;
use clipmark_common::{Clip, SelectionInfo, base_url};
use clipmark_core::ContentSettings;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Stored clips grouped by normalized page URL.
pub type ClipMap = BTreeMap<String, Vec<Clip>>;

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("Please enter a valid URL: {0}")]
    InvalidUrl(String),

    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("Start and end selectors are the same; pass --force to save anyway")]
    SameSelectors,

    #[error("No clip {id} under {url}")]
    NotFound { url: String, id: String },

    #[error("No clips saved for {0}")]
    UnknownUrl(String),

    #[error("Invalid import format: {0}")]
    InvalidImport(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Input of [`ClipRepository::add`].
#[derive(Debug, Clone, Default)]
pub struct NewClip {
    pub url: String,
    pub start_selector: String,
    pub start_offset: u32,
    pub end_selector: String,
    pub end_offset: u32,
    pub frame_selector: Option<String>,
    pub text: Option<String>,
    /// Save even when start and end selectors are identical.
    pub allow_same_selectors: bool,
}

/// Partial edit of a stored clip. `frame_selector: Some("")` clears the frame.
#[derive(Debug, Clone, Default)]
pub struct ClipPatch {
    pub start_selector: Option<String>,
    pub start_offset: Option<u32>,
    pub end_selector: Option<String>,
    pub end_offset: Option<u32>,
    pub frame_selector: Option<String>,
}

pub struct ClipRepository {
    store: Arc<dyn KeyValueStore>,
    write: Mutex<()>,
}

impl ClipRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<ClipMap, ClipError> {
        match self.store.get(CLIPS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value).map_err(StorageError::from)?),
            None => Ok(ClipMap::new()),
        }
    }

    async fn persist(&self, clips: &ClipMap) -> Result<(), ClipError> {
        let value = serde_json::to_value(clips).map_err(StorageError::from)?;
        self.store.set(CLIPS_KEY, value).await?;
        Ok(())
    }

    /// Store a selection captured by a content script.
    pub async fn save_selection(&self, request: SaveRequest) -> Result<Clip, ClipError> {
        let url = request
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ClipError::EmptyField("url"))?;
        let created_at = match request.created_at {
            0 => now_secs(),
            t => t,
        };
        let clip = Clip::from_selection(new_id(), request.selection, created_at)
            .with_text(request.text);
        self.append(&url, clip).await
    }

    /// Manual creation from the options page.
    pub async fn add(&self, new: NewClip) -> Result<Clip, ClipError> {
        if new.url.trim().is_empty() {
            return Err(ClipError::EmptyField("url"));
        }
        let start = new.start_selector.trim();
        let end = new.end_selector.trim();
        if start.is_empty() {
            return Err(ClipError::EmptyField("start selector"));
        }
        if end.is_empty() {
            return Err(ClipError::EmptyField("end selector"));
        }
        if start == end && !new.allow_same_selectors {
            return Err(ClipError::SameSelectors);
        }
        url::Url::parse(new.url.trim()).map_err(|_| ClipError::InvalidUrl(new.url.clone()))?;

        let mut selection = SelectionInfo::new(start, new.start_offset, end, new.end_offset);
        selection.frame_selector = new
            .frame_selector
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        let clip = Clip::from_selection(new_id(), selection, now_secs()).with_text(new.text);
        self.append(new.url.trim(), clip).await
    }

    async fn append(&self, url: &str, clip: Clip) -> Result<Clip, ClipError> {
        let url = base_url(url);
        let _guard = self.write.lock().await;
        let mut clips = self.load().await?;
        clips.entry(url.clone()).or_default().push(clip.clone());
        self.persist(&clips).await?;
        info!("Saved clip {} for {}", clip.id, url);
        Ok(clip)
    }

    pub async fn update(&self, url: &str, id: &str, patch: ClipPatch) -> Result<Clip, ClipError> {
        for (field, value) in [
            ("start selector", &patch.start_selector),
            ("end selector", &patch.end_selector),
        ] {
            if value.as_ref().is_some_and(|s| s.trim().is_empty()) {
                return Err(ClipError::EmptyField(field));
            }
        }

        let url = base_url(url);
        let _guard = self.write.lock().await;
        let mut clips = self.load().await?;
        let clip = clips
            .get_mut(&url)
            .and_then(|list| list.iter_mut().find(|c| c.id == id))
            .ok_or_else(|| not_found(&url, id))?;

        if let Some(start) = patch.start_selector {
            clip.start_selector = start.trim().to_string();
        }
        if let Some(offset) = patch.start_offset {
            clip.start_offset = offset;
        }
        if let Some(end) = patch.end_selector {
            clip.end_selector = end.trim().to_string();
        }
        if let Some(offset) = patch.end_offset {
            clip.end_offset = offset;
        }
        if let Some(frame) = patch.frame_selector {
            clip.frame_selector = Some(frame.trim().to_string()).filter(|f| !f.is_empty());
        }
        let updated = clip.clone();

        self.persist(&clips).await?;
        info!("Updated clip {} for {}", id, url);
        Ok(updated)
    }

    /// Remove one clip. The page entry goes away with its last clip.
    pub async fn delete(&self, url: &str, id: &str) -> Result<Clip, ClipError> {
        let url = base_url(url);
        let _guard = self.write.lock().await;
        let mut clips = self.load().await?;
        let list = clips.get_mut(&url).ok_or_else(|| not_found(&url, id))?;
        let index = list
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| not_found(&url, id))?;
        let removed = list.remove(index);
        if list.is_empty() {
            clips.remove(&url);
        }
        self.persist(&clips).await?;
        info!("Deleted clip {} for {}", id, url);
        Ok(removed)
    }

    /// Remove every clip of a page, returning how many there were.
    pub async fn delete_url(&self, url: &str) -> Result<usize, ClipError> {
        let url = base_url(url);
        let _guard = self.write.lock().await;
        let mut clips = self.load().await?;
        let removed = clips
            .remove(&url)
            .ok_or_else(|| ClipError::UnknownUrl(url.clone()))?;
        self.persist(&clips).await?;
        info!("Deleted {} clips for {}", removed.len(), url);
        Ok(removed.len())
    }

    pub async fn list(&self) -> Result<ClipMap, ClipError> {
        self.load().await
    }

    /// Clips of one page, in save order. Unknown pages have none.
    pub async fn list_for(&self, url: &str) -> Result<Vec<Clip>, ClipError> {
        Ok(self.load().await?.remove(&base_url(url)).unwrap_or_default())
    }

    pub async fn get(&self, url: &str, id: &str) -> Result<Clip, ClipError> {
        let url = base_url(url);
        self.list_for(&url)
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found(&url, id))
    }

    /// `{url, clips}` as pretty JSON.
    pub async fn export(&self, url: &str) -> Result<String, ClipError> {
        let url = base_url(url);
        let clips = self.list_for(&url).await?;
        if clips.is_empty() {
            return Err(ClipError::UnknownUrl(url));
        }
        let bundle = ClipBundle { url, clips };
        Ok(serde_json::to_string_pretty(&bundle).map_err(StorageError::from)?)
    }

    /// The clipboard card of one clip.
    pub async fn copy_card(&self, url: &str, id: &str) -> Result<String, ClipError> {
        let url = base_url(url);
        let clip = self.get(&url, id).await?;
        let card = ClipCard::copy_of(&url, &clip);
        Ok(serde_json::to_string_pretty(&card).map_err(StorageError::from)?)
    }

    pub async fn import(&self, json: &str) -> Result<ImportSummary, ClipError> {
        let payload: ImportPayload = serde_json::from_str(json)
            .map_err(|e| ClipError::InvalidImport(e.to_string()))?;

        let _guard = self.write.lock().await;
        let mut clips = self.load().await?;
        let summary = merge_import(&mut clips, payload, new_id);
        self.persist(&clips).await?;
        info!(
            "Imported {} clips for {} ({} duplicates skipped)",
            summary.added, summary.url, summary.skipped
        );
        Ok(summary)
    }

    /// Anything but an explicit `false` enables the button.
    pub async fn floating_button(&self) -> Result<bool, ClipError> {
        Ok(self.store.get(FLOATING_BUTTON_KEY).await? != Some(Value::Bool(false)))
    }

    pub async fn set_floating_button(&self, enabled: bool) -> Result<(), ClipError> {
        self.store.set(FLOATING_BUTTON_KEY, Value::Bool(enabled)).await?;
        debug!("enableFloatingBtn = {}", enabled);
        Ok(())
    }

    /// Only an explicit `true` switches copies to HTML.
    pub async fn copy_html(&self) -> Result<bool, ClipError> {
        Ok(self.store.get(COPY_HTML_KEY).await? == Some(Value::Bool(true)))
    }

    pub async fn set_copy_html(&self, enabled: bool) -> Result<(), ClipError> {
        self.store.set(COPY_HTML_KEY, Value::Bool(enabled)).await?;
        debug!("copyHtmlContent = {}", enabled);
        Ok(())
    }

    /// Content script settings as currently stored.
    pub async fn content_settings(&self) -> Result<ContentSettings, ClipError> {
        Ok(ContentSettings {
            floating_button: self.floating_button().await?,
            copy_html: self.copy_html().await?,
        })
    }
}

fn not_found(url: &str, id: &str) -> ClipError {
    ClipError::NotFound {
        url: url.to_string(),
        id: id.to_string(),
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
