//! Export, clipboard and import formats.

use crate::repository::ClipMap;
use clipmark_common::{Clip, base_url};
use serde::{Deserialize, Serialize};

/// Export file: every clip of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipBundle {
    pub url: String,
    pub clips: Vec<Clip>,
}

/// Clipboard card: a single clip flattened together with its page.
///
/// Copied cards carry no id, so pasting one always creates a new clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipCard {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub start_selector: String,
    #[serde(default)]
    pub start_offset: u32,
    pub end_selector: String,
    #[serde(default)]
    pub end_offset: u32,
    /// Empty for top-level clips.
    #[serde(default)]
    pub frame_selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub created_at: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl ClipCard {
    /// The clipboard form of a stored clip.
    pub fn copy_of(url: &str, clip: &Clip) -> Self {
        Self {
            base_url: url.to_string(),
            id: String::new(),
            start_selector: clip.start_selector.clone(),
            start_offset: clip.start_offset,
            end_selector: clip.end_selector.clone(),
            end_offset: clip.end_offset,
            frame_selector: clip.frame_selector.clone().unwrap_or_default(),
            text: None,
            created_at: 0,
        }
    }

    pub fn into_clip(self) -> Clip {
        let frame_selector = Some(self.frame_selector.trim().to_string()).filter(|f| !f.is_empty());
        Clip {
            id: self.id,
            start_selector: self.start_selector,
            start_offset: self.start_offset,
            end_selector: self.end_selector,
            end_offset: self.end_offset,
            frame_selector,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

/// Anything `import` accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Bundle(ClipBundle),
    Card(ClipCard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub url: String,
    pub added: usize,
    pub skipped: usize,
}

/// Merge an import into `clips`. Clips whose id already exists under the
/// page are skipped; clips without an id get one from `new_id`.
pub fn merge_import(
    clips: &mut ClipMap,
    payload: ImportPayload,
    mut new_id: impl FnMut() -> String,
) -> ImportSummary {
    let (url, incoming) = match payload {
        ImportPayload::Bundle(bundle) => (bundle.url, bundle.clips),
        ImportPayload::Card(card) => (card.base_url.clone(), vec![card.into_clip()]),
    };
    let url = base_url(&url);
    let list = clips.entry(url.clone()).or_default();

    let mut added = 0;
    let mut skipped = 0;
    for mut clip in incoming {
        if clip.id.is_empty() {
            clip.id = new_id();
        } else if list.iter().any(|c| c.id == clip.id) {
            skipped += 1;
            continue;
        }
        list.push(clip);
        added += 1;
    }

    if list.is_empty() {
        clips.remove(&url);
    }
    ImportSummary {
        url,
        added,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipmark_common::SelectionInfo;

    fn clip(id: &str) -> Clip {
        Clip::from_selection(id, SelectionInfo::new("p", 0, "p", 4), 100)
    }

    #[test]
    fn bundle_merges_by_id() {
        let mut clips = ClipMap::new();
        clips.insert("https://a.example/x".into(), vec![clip("1")]);

        let payload: ImportPayload = serde_json::from_str(
            r#"{"url":"https://a.example/x","clips":[
                {"id":"1","startSelector":"p","endSelector":"p"},
                {"id":"2","startSelector":"h1","startOffset":1,"endSelector":"h1","endOffset":3}
            ]}"#,
        )
        .unwrap();
        let summary = merge_import(&mut clips, payload, || unreachable!());

        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 1);
        let ids: Vec<_> = clips["https://a.example/x"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn copied_card_imports_as_a_new_clip() {
        let card = ClipCard::copy_of("https://a.example/x", &clip("1"));
        let json = serde_json::to_string(&card).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"frameSelector\":\"\""));

        let payload: ImportPayload = serde_json::from_str(&json).unwrap();
        let mut clips = ClipMap::new();
        let summary = merge_import(&mut clips, payload, || "fresh".to_string());
        assert_eq!(summary.added, 1);
        let stored = &clips["https://a.example/x"][0];
        assert_eq!(stored.id, "fresh");
        assert_eq!(stored.frame_selector, None);
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert!(serde_json::from_str::<ImportPayload>(r#"{"foo":1}"#).is_err());
        assert!(serde_json::from_str::<ImportPayload>(r#"{"url":"x","clips":{}}"#).is_err());
    }
}
