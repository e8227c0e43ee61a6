//! SQLite store tests against a real database file.

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use topten_archive::config::Config;
use topten_archive::models::{ArticleDetails, ArticleId, ListEntry};
use topten_archive::sqlite_store::SqliteStore;
use topten_archive::store::ArchiveStore;
use topten_archive::{db, migrate, pipeline, ArchiveError};

async fn setup() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let config: Config = toml::from_str(&format!(
        "[db]\npath = \"{}\"\n",
        tmp.path().join("data/topten.sqlite").display()
    ))
    .unwrap();
    let pool = db::connect(&config).await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();
    (tmp, SqliteStore::new(pool))
}

fn day(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_schema_is_idempotent() {
    let (_tmp, store) = setup().await;
    migrate::apply_schema(store.pool()).await.unwrap();
    migrate::apply_schema(store.pool()).await.unwrap();
}

#[tokio::test]
async fn test_resolve_or_create_dedups_and_keeps_first_title() {
    let (_tmp, store) = setup().await;

    let first = store.resolve_or_create("/a.html", "Original").await.unwrap();
    let again = store.resolve_or_create("/a.html", "Renamed").await.unwrap();
    let other = store.resolve_or_create("/b.html", "Other").await.unwrap();

    assert!(first.created);
    assert!(!again.created);
    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other.id);

    let missing = store.articles_missing_details().await.unwrap();
    let a = missing.iter().find(|a| a.id == first.id).unwrap();
    assert_eq!(a.title, "Original");
}

#[tokio::test]
async fn test_record_day_is_all_or_nothing() {
    let (_tmp, store) = setup().await;

    let mut ids = Vec::new();
    for i in 0..6 {
        let r = store
            .resolve_or_create(&format!("/{}.html", i), "t")
            .await
            .unwrap();
        ids.push(r.id);
    }

    // The sixth handle is already recorded for this capture.
    store.record_day(day(2024, 1, 1), &ids[5..]).await.unwrap();

    let err = store.record_day(day(2024, 1, 1), &ids).await.unwrap_err();
    assert!(matches!(err, ArchiveError::AlreadyRecorded { .. }));

    let rows = store
        .positions_between(day(2024, 1, 1), day(2024, 1, 2))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].article.id, ids[5]);
    assert_eq!(rows[0].position, 1);
}

#[tokio::test]
async fn test_record_day_rejects_unknown_handle() {
    let (_tmp, store) = setup().await;
    let known = store.resolve_or_create("/a.html", "A").await.unwrap();

    let err = store
        .record_day(day(2024, 1, 1), &[known.id, ArticleId(9999)])
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::UnknownArticle(ArticleId(9999))));

    let rows = store
        .positions_between(day(2024, 1, 1), day(2024, 1, 2))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_record_day_rejects_empty_list() {
    let (_tmp, store) = setup().await;
    let err = store.record_day(day(2024, 1, 1), &[]).await.unwrap_err();
    assert!(matches!(err, ArchiveError::EmptyList));
}

#[tokio::test]
async fn test_details_attach_once() {
    let (_tmp, store) = setup().await;
    let a = store.resolve_or_create("/a.html", "A").await.unwrap();
    let b = store.resolve_or_create("/b.html", "B").await.unwrap();

    let details = ArticleDetails {
        description: "desc".to_string(),
        image_url: "https://img/a.jpg".to_string(),
    };
    store.attach_details(a.id, &details).await.unwrap();

    let err = store.attach_details(a.id, &details).await.unwrap_err();
    assert!(matches!(err, ArchiveError::DetailsExist(id) if id == a.id));

    let err = store
        .attach_details(ArticleId(4242), &details)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::UnknownArticle(_)));

    let missing = store.articles_missing_details().await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id, b.id);
}

#[tokio::test]
async fn test_positions_carry_details_when_present() {
    let (_tmp, store) = setup().await;
    let a = store.resolve_or_create("/a.html", "A").await.unwrap();
    let b = store.resolve_or_create("/b.html", "B").await.unwrap();
    store.record_day(day(2024, 2, 1), &[a.id, b.id]).await.unwrap();
    store
        .attach_details(
            b.id,
            &ArticleDetails {
                description: "about b".to_string(),
                image_url: String::new(),
            },
        )
        .await
        .unwrap();

    let rows = store
        .positions_between(day(2024, 2, 1), day(2024, 2, 2))
        .await
        .unwrap();
    let row_a = rows.iter().find(|r| r.article.id == a.id).unwrap();
    let row_b = rows.iter().find(|r| r.article.id == b.id).unwrap();
    assert!(row_a.details.is_none());
    assert_eq!(row_b.details.as_ref().unwrap().description, "about b");
    assert_eq!(row_b.position, 2);
    assert_eq!(row_b.captured_at, day(2024, 2, 1));
}

#[tokio::test]
async fn test_two_day_ratings_through_pipeline() {
    let (_tmp, store) = setup().await;

    let day1 = vec![
        ListEntry::new("L1", "A"),
        ListEntry::new("L2", "B"),
        ListEntry::new("L3", "C"),
    ];
    let day2 = vec![
        ListEntry::new("L2", "B"),
        ListEntry::new("L1", "A"),
        ListEntry::new("L4", "D"),
    ];
    pipeline::ingest_day(&store, day(2024, 1, 1), &day1, Some(3))
        .await
        .unwrap();
    let report = pipeline::ingest_day(&store, day(2024, 1, 2), &day2, Some(3))
        .await
        .unwrap();
    assert_eq!(report.new_articles, 1);

    let ratings = pipeline::query_ratings(&store, date("2024-01-01"), date("2024-01-02"))
        .await
        .unwrap();
    let got: Vec<(&str, f64)> = ratings
        .iter()
        .map(|r| (r.article.link.as_str(), r.rating))
        .collect();
    assert_eq!(
        got,
        vec![("L1", 1.5), ("L2", 1.5), ("L3", 0.25), ("L4", 0.25)]
    );

    let single = pipeline::query_ratings(&store, date("2024-01-02"), date("2024-01-02"))
        .await
        .unwrap();
    assert_eq!(single[0].article.link, "L2");
    assert_eq!(single[0].rating, 1.0);
}

#[tokio::test]
async fn test_range_without_captures_is_empty() {
    let (_tmp, store) = setup().await;
    let ratings = pipeline::query_ratings(&store, date("2030-01-01"), date("2030-12-31"))
        .await
        .unwrap();
    assert!(ratings.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_ingest_of_same_day_has_one_winner() {
    let (_tmp, store) = setup().await;
    let list: Vec<ListEntry> = (1..=10)
        .map(|i| ListEntry::new(format!("/{}.html", i), format!("Meldung {}", i)))
        .collect();

    for round in 0..20u32 {
        let at = day(2024, 1, 1) + chrono::Duration::days(i64::from(round));
        let (a, b) = tokio::join!(
            pipeline::ingest_day(&store, at, &list, Some(10)),
            pipeline::ingest_day(&store, at, &list, Some(10)),
        );

        let outcomes = [a, b];
        let ok = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1, "round {}", round);
        let err = outcomes
            .into_iter()
            .find_map(|r| r.err())
            .unwrap();
        assert!(
            matches!(err, ArchiveError::AlreadyRecorded { .. }),
            "round {}: {:?}",
            round,
            err
        );

        let rows = store
            .positions_between(at, at + chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 10, "round {}", round);
    }

    let articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(articles, 10);
}
