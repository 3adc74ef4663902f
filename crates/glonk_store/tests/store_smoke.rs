use std::collections::HashMap;
use std::sync::Arc;

use glonk_store::{
    AnyRecord, Filter, GlonkConfig, GlonkError, GlonkResult, GlonkStore, Note, Post, RecordKind,
    RecordStore, RecordVariant, Registry, User,
};
use sea_orm::ConnectionTrait;
use tempfile::{tempdir, TempDir};

async fn sqlite_store() -> GlonkResult<(TempDir, GlonkStore)> {
    let dir = tempdir().expect("tempdir");
    let config = GlonkConfig::default_sqlite(dir.path().join("store.sqlite").to_string_lossy());
    let registry = Arc::new(Registry::new()?);
    let store = GlonkStore::connect(&config, dir.path(), registry).await?;
    Ok((dir, store))
}

async fn raw(store: &GlonkStore, sql: &str) -> GlonkResult<()> {
    store
        .connection()
        .execute_unprepared(sql)
        .await
        .map_err(GlonkError::from)?;
    Ok(())
}

async fn create_note(store: &GlonkStore, owner_id: i64, contents: &str) -> GlonkResult<Note> {
    let created = store
        .create(
            Note {
                owner_id,
                contents: contents.to_string(),
                ..Note::default()
            }
            .into(),
        )
        .await?;
    Ok(Note::from_any(created).expect("note"))
}

async fn notes_of(store: &GlonkStore, owner_id: i64) -> GlonkResult<Vec<Note>> {
    let meta = store.registry().meta(RecordKind::Note);
    let records = store.get_by_filters(meta, &[], owner_id).await?;
    Ok(records
        .into_iter()
        .filter_map(Note::from_any)
        .collect())
}

#[tokio::test]
async fn create_assigns_identity_and_keeps_owner() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let note = create_note(&store, 7, "hello").await?;
    assert!(note.id > 0);
    assert_eq!(note.owner_id, 7);
    assert_eq!(note.contents, "hello");

    let meta = store.registry().meta(RecordKind::Note);
    let fetched = store.get(meta, note.id, 7).await?;
    assert_eq!(fetched, AnyRecord::from(note.clone()));

    let second = create_note(&store, 7, "again").await?;
    assert_ne!(second.id, note.id);
    Ok(())
}

#[tokio::test]
async fn get_is_scoped_to_the_owner() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let note = create_note(&store, 9, "private").await?;
    let meta = store.registry().meta(RecordKind::Note);
    let err = store.get(meta, note.id, 7).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));
    let err = store.get(meta, note.id + 100, 9).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn update_by_another_owner_is_not_found() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let note = create_note(&store, 9, "original").await?;

    let attempt = Note {
        id: note.id,
        owner_id: 7,
        contents: "hijacked".into(),
    };
    let err = store.update(attempt.into()).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));

    let meta = store.registry().meta(RecordKind::Note);
    let unchanged = Note::from_any(store.get(meta, note.id, 9).await?).expect("note");
    assert_eq!(unchanged.contents, "original");
    Ok(())
}

#[tokio::test]
async fn sparse_update_touches_only_supplied_fields() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let meta = store.registry().meta(RecordKind::User);
    let user = User::from_any(
        store
            .create(
                User {
                    guid: "google/42".into(),
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                    picture: "https://example.com/ada.png".into(),
                    ..User::default()
                }
                .into(),
            )
            .await?,
    )
    .expect("user");

    let updated = User::from_any(
        store
            .update(
                User {
                    id: user.id,
                    name: "Ada L.".into(),
                    ..User::default()
                }
                .into(),
            )
            .await?,
    )
    .expect("user");
    assert_eq!(updated.name, "Ada L.");
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.picture, user.picture);
    assert_eq!(updated.guid, user.guid);

    let empty = User {
        id: user.id,
        ..User::default()
    };
    let err = store.update(empty.into()).await.unwrap_err();
    assert!(matches!(err, GlonkError::InvalidInput { .. }));

    let fetched = store.get(meta, user.id, user.id).await?;
    assert_eq!(fetched, AnyRecord::from(updated));
    Ok(())
}

#[tokio::test]
async fn filters_are_always_anded_with_the_owner() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let mine = create_note(&store, 7, "hello world").await?;
    create_note(&store, 9, "hello there").await?;
    create_note(&store, 12, "hello again").await?;
    let meta = store.registry().meta(RecordKind::Note);

    let mut raw = HashMap::new();
    raw.insert("byOwnerId".to_string(), vec!["7|9".to_string()]);
    let filters = meta.parse_filters(&raw);
    assert_eq!(filters.len(), 1);
    let found = store.get_by_filters(meta, &filters, 7).await?;
    assert_eq!(found, vec![AnyRecord::from(mine.clone())]);

    let needle = vec![Filter::contains("contents", &["world"]).expect("filter")];
    assert_eq!(store.get_by_filters(meta, &needle, 9).await?, Vec::new());
    assert_eq!(store.get_by_filters(meta, &needle, 7).await?.len(), 1);

    raw.insert("byOwnerId".to_string(), vec!["seven".to_string()]);
    let filters = meta.parse_filters(&raw);
    assert!(filters.is_empty());
    assert_eq!(store.get_by_filters(meta, &filters, 12).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_missing_row_leaves_table_unchanged() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let kept = create_note(&store, 7, "keep me").await?;
    let meta = store.registry().meta(RecordKind::Note);

    let err = store.delete(meta, kept.id + 1000, 7).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));
    let err = store.delete(meta, kept.id, 8).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));
    assert_eq!(notes_of(&store, 7).await?, vec![kept.clone()]);

    let removed = store.delete(meta, kept.id, 7).await?;
    assert_eq!(removed, AnyRecord::from(kept));
    assert!(notes_of(&store, 7).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn posts_are_scoped_by_author() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let meta = store.registry().meta(RecordKind::Post);
    let post = Post::from_any(
        store
            .create(
                Post {
                    author_id: 3,
                    contents: "first post".into(),
                    ..Post::default()
                }
                .into(),
            )
            .await?,
    )
    .expect("post");
    assert_eq!(post.author_id, 3);

    let mut raw = HashMap::new();
    raw.insert("byAuthorId".to_string(), vec!["3".to_string()]);
    let found = store
        .get_by_filters(meta, &meta.parse_filters(&raw), 3)
        .await?;
    assert_eq!(found.len(), 1);
    assert!(store.get_by_filters(meta, &[], 4).await?.is_empty());

    let edited = Post {
        id: post.id,
        author_id: 3,
        contents: "edited".into(),
    };
    let updated = store.update(edited.clone().into()).await?;
    assert_eq!(updated, AnyRecord::from(edited));
    Ok(())
}

#[tokio::test]
async fn users_are_found_by_external_key() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    let meta = store.registry().meta(RecordKind::User);
    let err = store
        .get_by_external_key(meta, "google/1")
        .await
        .unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));

    let created = store
        .create(
            User {
                guid: "google/1".into(),
                name: "Grace".into(),
                ..User::default()
            }
            .into(),
        )
        .await?;
    let found = store.get_by_external_key(meta, "google/1").await?;
    assert_eq!(found, created);
    let user = User::from_any(found).expect("user");
    assert_eq!(user.email, "");

    let duplicate = User {
        guid: "google/1".into(),
        name: "Grace again".into(),
        ..User::default()
    };
    let err = store.create(duplicate.into()).await.unwrap_err();
    assert!(matches!(err, GlonkError::Storage { .. }));
    Ok(())
}

#[tokio::test]
async fn duplicated_identity_is_an_integrity_error() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    raw(&store, "DROP TABLE notes").await?;
    raw(
        &store,
        "CREATE TABLE notes (id INTEGER, owner_id BIGINT, contents TEXT)",
    )
    .await?;
    raw(
        &store,
        "INSERT INTO notes (id, owner_id, contents) VALUES (1, 7, 'a'), (1, 7, 'b')",
    )
    .await?;

    let meta = store.registry().meta(RecordKind::Note);
    let err = store.get(meta, 1, 7).await.unwrap_err();
    assert!(matches!(err, GlonkError::Integrity { .. }));
    let err = store.get(meta, 1, 9).await.unwrap_err();
    assert!(matches!(err, GlonkError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn unsupported_cell_types_decode_as_empty() -> GlonkResult<()> {
    let (_dir, store) = sqlite_store().await?;
    raw(
        &store,
        "INSERT INTO notes (id, owner_id, contents) VALUES (500, 7, X'DEADBEEF')",
    )
    .await?;

    let meta = store.registry().meta(RecordKind::Note);
    let fetched = Note::from_any(store.get(meta, 500, 7).await?).expect("note");
    assert_eq!(
        fetched,
        Note {
            id: 500,
            owner_id: 7,
            contents: String::new(),
        }
    );
    assert_eq!(notes_of(&store, 7).await?, vec![fetched]);
    Ok(())
}
