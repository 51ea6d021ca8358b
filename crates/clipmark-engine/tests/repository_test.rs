use clipmark_engine::storage::{JsonFileStore, MemoryStore};
use clipmark_engine::{ClipError, ClipPatch, ClipRepository, NewClip};
use std::sync::Arc;

const URL: &str = "https://docs.example/guide/?tab=1#setup";
const BASE: &str = "https://docs.example/guide";

fn repository() -> ClipRepository {
    ClipRepository::new(Arc::new(MemoryStore::new()))
}

fn new_clip(start: &str, end: &str) -> NewClip {
    NewClip {
        url: URL.into(),
        start_selector: start.into(),
        start_offset: 2,
        end_selector: end.into(),
        end_offset: 7,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_add_groups_by_base_url() {
    let repo = repository();
    let first = repo.add(new_clip("#intro", "p.note")).await.unwrap();
    let second = repo.add(new_clip("h1", "h2")).await.unwrap();
    assert_ne!(first.id, second.id);

    let all = repo.list().await.unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec![BASE]);
    assert_eq!(all[BASE], vec![first.clone(), second]);
    assert_eq!(repo.get(URL, &first.id).await.unwrap(), first);
}

#[tokio::test]
async fn test_update_patches_fields() {
    let repo = repository();
    let mut new = new_clip("#intro", "p.note");
    new.frame_selector = Some("iframe.doc".into());
    let clip = repo.add(new).await.unwrap();

    let patch = ClipPatch {
        end_offset: Some(12),
        frame_selector: Some(String::new()),
        ..Default::default()
    };
    let updated = repo.update(BASE, &clip.id, patch).await.unwrap();
    assert_eq!(updated.end_offset, 12);
    assert_eq!(updated.frame_selector, None);
    assert_eq!(updated.start_selector, "#intro");

    let empty = ClipPatch {
        start_selector: Some("".into()),
        ..Default::default()
    };
    assert!(matches!(
        repo.update(BASE, &clip.id, empty).await,
        Err(ClipError::EmptyField("start selector"))
    ));
    assert!(matches!(
        repo.update(BASE, "missing", ClipPatch::default()).await,
        Err(ClipError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_drops_empty_pages() {
    let repo = repository();
    let a = repo.add(new_clip("#a", "#b")).await.unwrap();
    let b = repo.add(new_clip("#c", "#d")).await.unwrap();

    repo.delete(BASE, &a.id).await.unwrap();
    assert_eq!(repo.list_for(BASE).await.unwrap(), vec![b.clone()]);
    repo.delete(BASE, &b.id).await.unwrap();
    assert!(repo.list().await.unwrap().is_empty());

    assert!(matches!(
        repo.delete(BASE, &b.id).await,
        Err(ClipError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete_url(BASE).await,
        Err(ClipError::UnknownUrl(_))
    ));
}

#[tokio::test]
async fn test_delete_url_removes_every_clip() {
    let repo = repository();
    repo.add(new_clip("#a", "#b")).await.unwrap();
    repo.add(new_clip("#c", "#d")).await.unwrap();
    assert_eq!(repo.delete_url(URL).await.unwrap(), 2);
    assert!(repo.list_for(BASE).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_then_import_skips_duplicates() {
    let repo = repository();
    repo.add(new_clip("#a", "#b")).await.unwrap();
    repo.add(new_clip("#c", "#d")).await.unwrap();
    let exported = repo.export(URL).await.unwrap();
    assert!(exported.contains("\"url\": \"https://docs.example/guide\""));

    let other = repository();
    let summary = other.import(&exported).await.unwrap();
    assert_eq!((summary.added, summary.skipped), (2, 0));
    let again = other.import(&exported).await.unwrap();
    assert_eq!((again.added, again.skipped), (0, 2));
    assert_eq!(other.list_for(BASE).await.unwrap(), repo.list_for(BASE).await.unwrap());
}

#[tokio::test]
async fn test_copied_card_pastes_as_new_clip() {
    let repo = repository();
    let clip = repo.add(new_clip("#a", "#b")).await.unwrap();
    let card = repo.copy_card(BASE, &clip.id).await.unwrap();
    assert!(card.contains("\"baseUrl\""));

    let summary = repo.import(&card).await.unwrap();
    assert_eq!(summary.added, 1);
    let clips = repo.list_for(BASE).await.unwrap();
    assert_eq!(clips.len(), 2);
    assert_ne!(clips[1].id, clip.id);
    assert_eq!(clips[1].selection(), clip.selection());
}

#[tokio::test]
async fn test_invalid_import_is_rejected_without_writing() {
    let repo = repository();
    for input in ["not json", r#"{"clips": []}"#, r#"[1, 2, 3]"#] {
        assert!(matches!(
            repo.import(input).await,
            Err(ClipError::InvalidImport(_))
        ));
    }
    assert!(repo.list().await.unwrap().is_empty());
    assert!(matches!(
        repo.export(BASE).await,
        Err(ClipError::UnknownUrl(_))
    ));
}

#[tokio::test]
async fn test_file_backed_repository_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let clip = ClipRepository::new(Arc::new(JsonFileStore::new(&path)))
        .add(new_clip("#a", "#b"))
        .await
        .unwrap();

    let reopened = ClipRepository::new(Arc::new(JsonFileStore::new(&path)));
    assert_eq!(reopened.get(BASE, &clip.id).await.unwrap(), clip);

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["clips"][BASE][0]["startSelector"], "#a");
}
