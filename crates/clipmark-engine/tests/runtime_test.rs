use clipmark_common::SelectionInfo;
use clipmark_common::protocol::{HighlightRequest, PageMessage, TextResponse};
use clipmark_core::{
    ContentSettings, Document, FrameId, HIGHLIGHT_CLASS, HighlightSettings, Page, Tab, find_text,
};
use clipmark_engine::storage::MemoryStore;
use clipmark_engine::{Background, ClipRepository, TabRuntime};
use std::sync::Arc;
use std::time::Duration;

fn tab() -> Tab {
    let page = Page::new(
        "https://blog.example/post/?ref=feed",
        Document::parse(r#"<h1 id="t">Title</h1><iframe class="embed" src="/e"></iframe>"#).unwrap(),
    )
    .unwrap();
    let mut tab: Tab = Tab::new(page, ContentSettings::default(), HighlightSettings::default());
    tab.attach_frame(
        FrameId::TOP,
        "iframe",
        Document::parse("<p>Embedded words here</p>").unwrap(),
        "https://blog.example/e",
    )
    .unwrap();
    tab
}

fn background() -> (Arc<ClipRepository>, Background) {
    let repository = Arc::new(ClipRepository::new(Arc::new(MemoryStore::new())));
    (repository.clone(), Background::new(repository))
}

fn highlighted(tab: &mut Tab) -> usize {
    let selector = format!(".{}", HIGHLIGHT_CLASS);
    tab.page()
        .document(FrameId::TOP)
        .query_selector_all(&selector)
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_request_collects_frame_answers() {
    let (_, background) = background();
    let (handle, _task) = TabRuntime::spawn(tab(), background);

    let clip = SelectionInfo::new("p", 0, "p", 8).in_frame("iframe.embed");
    let answers = handle.request(PageMessage::GetSelectedText(clip)).await.unwrap();
    assert_eq!(answers, vec![TextResponse { text: "Embedded".into() }]);
}

#[tokio::test(start_paused = true)]
async fn test_temporary_highlight_expires() {
    let (_, background) = background();
    let (handle, _task) = TabRuntime::spawn(tab(), background);

    handle
        .notify(PageMessage::HighlightSelector(HighlightRequest {
            selector: "#t".into(),
            frame_selector: None,
            temporary: true,
        }))
        .await
        .unwrap();
    assert_eq!(handle.with(highlighted).await.unwrap(), 1);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(handle.with(highlighted).await.unwrap(), 0);
}

#[tokio::test]
async fn test_frame_capture_is_saved_under_top_url() {
    let (repository, background) = background();
    let (handle, task) = TabRuntime::spawn(tab(), background);

    let frame = handle
        .with(|tab| {
            let frame = tab.page().frame_ids().nth(1).unwrap();
            let doc = tab.page_mut().document_mut(frame);
            let body = doc.body().unwrap();
            let range = find_text(doc, body, "words").unwrap();
            doc.set_selection(range);
            frame
        })
        .await
        .unwrap();

    let responses = handle.capture(frame, 1_700_000_000).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].success);

    let clips = repository.list_for("https://blog.example/post").await.unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].selection(), SelectionInfo::new("p", 9, "p", 14).in_frame("iframe.embed"));
    assert_eq!(clips[0].text.as_deref(), Some("words"));

    drop(handle);
    let tab = task.await.unwrap();
    assert_eq!(tab.page().frame_ids().count(), 2);
}
