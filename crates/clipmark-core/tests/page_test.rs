use clipmark_common::SelectionInfo;
use clipmark_common::protocol::{
    HighlightRequest, PageMessage, RemoveHighlightRequest, RuntimeMessage, TextResponse,
};
use clipmark_core::{
    ContentSettings, Document, FrameId, HIGHLIGHT_CLASS, HighlightSettings, Page, Tab, find_text,
    frame_selector,
};
use std::time::Instant;

const TOP: &str = r#"
<h1 id="title">Manual</h1>
<section><p class="intro">Top level intro.</p></section>
<iframe class="chapter" src="/ch1"></iframe>
<iframe class="chapter" name="frame_2" src="/ch2"></iframe>
"#;

const CHAPTER: &str = r#"<h2>Chapter</h2><p class="intro">Frame intro.</p>"#;

fn tab() -> (Tab, FrameId, FrameId) {
    let page = Page::new("https://manual.example/book/?v=2#top", Document::parse(TOP).unwrap()).unwrap();
    let mut tab: Tab = Tab::new(page, ContentSettings::default(), HighlightSettings::default());
    let first = tab
        .attach_frame(
            FrameId::TOP,
            "iframe:nth-of-type(1)",
            Document::parse(CHAPTER).unwrap(),
            "https://manual.example/ch1",
        )
        .unwrap();
    let second = tab
        .attach_frame(
            FrameId::TOP,
            "iframe:nth-of-type(2)",
            Document::parse(CHAPTER).unwrap(),
            "https://manual.example/ch2",
        )
        .unwrap();
    (tab, first, second)
}

fn highlighted_count(tab: &Tab) -> usize {
    let selector = format!(".{}", HIGHLIGHT_CLASS);
    tab.page()
        .frame_ids()
        .map(|f| tab.page().document(f).query_selector_all(&selector).unwrap().len())
        .sum()
}

fn highlight(selector: &str, frame: Option<&str>) -> PageMessage {
    PageMessage::HighlightSelector(HighlightRequest {
        selector: selector.into(),
        frame_selector: frame.map(String::from),
        temporary: false,
    })
}

#[test]
fn test_frame_selectors_are_positional_for_twin_iframes() {
    let (tab, first, second) = tab();
    assert_eq!(
        frame_selector(tab.page(), first).as_deref(),
        Some("iframe.chapter:nth-of-type(1)")
    );
    assert_eq!(
        frame_selector(tab.page(), second).as_deref(),
        Some("iframe.chapter:nth-of-type(2)")
    );
}

#[test]
fn test_frame_scoped_clip_is_handled_only_by_its_frame() {
    let (mut tab, _, _) = tab();
    let clip = SelectionInfo::new("p.intro", 0, "p.intro", 5).in_frame("iframe.chapter:nth-of-type(2)");
    let answers = tab.dispatch(&PageMessage::GetSelectedText(clip), Instant::now());
    assert_eq!(answers, vec![TextResponse { text: "Frame".into() }]);

    let top_clip = SelectionInfo::new("p.intro", 0, "p.intro", 3);
    let answers = tab.dispatch(&PageMessage::GetSelectedText(top_clip), Instant::now());
    assert_eq!(answers, vec![TextResponse { text: "Top".into() }]);
}

#[test]
fn test_highlight_twice_leaves_one_highlight() {
    let (mut tab, _, _) = tab();
    let now = Instant::now();
    tab.dispatch(&highlight("#title", None), now);
    tab.dispatch(&highlight("#title", None), now);
    assert_eq!(highlighted_count(&tab), 1);
}

#[test]
fn test_at_most_one_highlight_per_frame_across_sequences() {
    let (mut tab, _, _) = tab();
    let now = Instant::now();
    let sequence = [
        highlight("#title", None),
        highlight("p.intro", None),
        highlight("h2", Some("iframe.chapter:nth-of-type(1)")),
        highlight("p.intro", Some("iframe.chapter:nth-of-type(1)")),
        PageMessage::RemoveHighlight(RemoveHighlightRequest::default()),
        highlight("body", None),
        highlight("#title", None),
        highlight("#missing", None),
    ];

    for message in &sequence {
        tab.dispatch(message, now);
        for frame in tab.page().frame_ids() {
            let count = tab
                .page()
                .document(frame)
                .query_selector_all(&format!(".{}", HIGHLIGHT_CLASS))
                .unwrap()
                .len();
            assert!(count <= 1, "frame {:?} has {} highlights", frame, count);
        }
    }
    assert_eq!(highlighted_count(&tab), 2);
}

#[test]
fn test_capture_from_frame_stamps_top_url() {
    let (mut tab, _, second) = tab();
    let doc = tab.page_mut().document_mut(second);
    let body = doc.body().unwrap();
    let range = find_text(doc, body, "intro").unwrap();
    doc.set_selection(range);

    let saved = tab.capture(second, 1_700_000_000);
    assert_eq!(saved.len(), 1);
    let RuntimeMessage::SaveSelectedText { data } = &saved[0];
    assert_eq!(data.url.as_deref(), Some("https://manual.example/book/?v=2#top"));
    assert_eq!(
        data.selection,
        SelectionInfo::new("p.intro", 6, "p.intro", 11).in_frame("iframe.chapter:nth-of-type(2)")
    );
    assert_eq!(data.text.as_deref(), Some("intro"));
}

#[test]
fn test_popup_json_is_dispatched() {
    let (mut tab, _, _) = tab();
    let message: PageMessage = serde_json::from_str(
        r#"{"type":"get_selected_text","startSelector":"h2","startOffset":0,"endSelector":"h2","endOffset":7,"frameSelector":"iframe.chapter:nth-of-type(1)"}"#,
    )
    .unwrap();
    let answers = tab.dispatch(&message, Instant::now());
    assert_eq!(answers, vec![TextResponse { text: "Chapter".into() }]);
}

#[test]
fn test_cross_origin_frame_ignores_requests_for_other_frames() {
    let page = Page::new(
        "https://reader.example/doc",
        Document::parse(r#"<iframe class="ad"></iframe><iframe class="viewer"></iframe>"#).unwrap(),
    )
    .unwrap();
    let mut tab: Tab = Tab::new(page, ContentSettings::default(), HighlightSettings::default());
    tab.attach_frame(
        FrameId::TOP,
        "iframe.ad",
        Document::parse("<p>advert</p>").unwrap(),
        "https://ads.example/slot",
    )
    .unwrap();
    tab.attach_frame(
        FrameId::TOP,
        "iframe.viewer",
        Document::parse("<p>viewer</p>").unwrap(),
        "https://reader.example/viewer",
    )
    .unwrap();

    let request = SelectionInfo::new("p", 0, "p", 6).in_frame("iframe.viewer");
    let answers = tab.dispatch(&PageMessage::GetSelectedText(request), Instant::now());
    assert_eq!(answers, vec![TextResponse { text: "viewer".into() }]);
}
