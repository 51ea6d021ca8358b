//! Loading HTML files from disk into a [`Tab`].

use anyhow::{Context, Result, anyhow};
use clipmark_core::{ContentSettings, Document, FrameId, HighlightSettings, Page, Tab};
use std::path::{Path, PathBuf};

/// `--frame SELECTOR=FILE[@URL]`: an iframe of the top document and the
/// markup loaded into it. Without a URL the frame shares the page's.
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub selector: String,
    pub file: PathBuf,
    pub url: Option<String>,
}

pub fn parse_frame_spec(value: &str) -> Result<FrameSpec, String> {
    let (selector, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SELECTOR=FILE[@URL], got '{}'", value))?;
    let (file, url) = match rest.split_once('@') {
        Some((file, url)) => (file, Some(url.to_string())),
        None => (rest, None),
    };
    if selector.trim().is_empty() || file.is_empty() {
        return Err(format!("expected SELECTOR=FILE[@URL], got '{}'", value));
    }
    Ok(FrameSpec {
        selector: selector.trim().to_string(),
        file: PathBuf::from(file),
        url,
    })
}

fn read_document(path: &Path) -> Result<Document> {
    let markup = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Document::parse(&markup).map_err(|e| anyhow!("{}: {}", path.display(), e))
}

pub fn load_tab(
    page: &Path,
    url: &str,
    frames: &[FrameSpec],
    settings: ContentSettings,
    highlight: HighlightSettings,
) -> Result<Tab> {
    let top = Page::new(url, read_document(page)?)?;
    let mut tab: Tab = Tab::new(top, settings, highlight);
    for frame in frames {
        let document = read_document(&frame.file)?;
        let frame_url = frame.url.as_deref().unwrap_or(url);
        tab.attach_frame(FrameId::TOP, &frame.selector, document, frame_url)
            .with_context(|| format!("Failed to load frame '{}'", frame.selector))?;
    }
    Ok(tab)
}

/// The frame to act in: the top document, or the n-th `--frame` (1-based).
pub fn frame_at(tab: &Tab, index: usize) -> Result<FrameId> {
    tab.page()
        .frame_ids()
        .nth(index)
        .ok_or_else(|| anyhow!("No frame #{}", index))
}

/// Select the first occurrence of `needle` in a frame's body.
pub fn select_text(tab: &mut Tab, frame: FrameId, needle: &str) -> Result<()> {
    let doc = tab.page_mut().document_mut(frame);
    let body = doc.body().ok_or_else(|| anyhow!("Frame has no body"))?;
    let range = clipmark_core::find_text(doc, body, needle)
        .ok_or_else(|| anyhow!("'{}' not found", needle))?;
    doc.set_selection(range);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_spec_forms() {
        let spec = parse_frame_spec("iframe.doc=ch1.html").unwrap();
        assert_eq!(spec.selector, "iframe.doc");
        assert_eq!(spec.file, PathBuf::from("ch1.html"));
        assert_eq!(spec.url, None);

        let spec = parse_frame_spec("iframe=f.html@https://other.example/f").unwrap();
        assert_eq!(spec.url.as_deref(), Some("https://other.example/f"));

        assert!(parse_frame_spec("nofile").is_err());
        assert!(parse_frame_spec("=f.html").is_err());
    }
}
