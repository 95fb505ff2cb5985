mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;

use common::{
    ALICE, ALICE_TOKEN, BOB_TOKEN, FlakyDeleteCache, InMemoryStore, InMemoryTokens,
    seeded_store, server_with, test_app,
};

fn payload(title: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "body": "I have a Vec of structs and want it ordered.",
        "tags": tags,
    })
}

/// Server over the seeded store whose cache deletes fail after `deletes` calls.
fn flaky_server(deletes: usize) -> (TestServer, Arc<InMemoryStore>) {
    let store = Arc::new(seeded_store());
    let server = server_with(
        store.clone(),
        Arc::new(InMemoryTokens::with_defaults()),
        Arc::new(FlakyDeleteCache::failing_after(deletes)),
    );
    (server, store)
}

async fn listed_title(server: &TestServer, id: i64) -> Option<String> {
    let listing = server.get("/questions").await.json::<Value>();
    listing["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["id"] == id)
        .map(|row| row["title"].as_str().unwrap().to_string())
}

// ─── CREATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_requires_token() {
    let app = test_app();

    let response = app
        .server
        .post("/questions")
        .json(&payload("How to sort", &[]))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header("www-authenticate").to_str().unwrap(),
        "Bearer"
    );
    assert!(app.cache.deleted_keys().is_empty());
}

#[tokio::test]
async fn test_create_question_invalidates_listing() {
    let app = test_app();

    // Warm the listing
    app.server.get("/questions").await.assert_status_ok();
    assert_eq!(app.store.list_reads(), 1);

    let response = app
        .server
        .post("/questions")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("Sorting with Rayon", &["Rust", "rayon"]))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    let id = json["question"]["id"].as_i64().unwrap();
    assert_eq!(json["question"]["slug"], "sorting-with-rayon");
    assert_eq!(json["question"]["user_id"], ALICE);
    assert_eq!(json["url"], format!("/questions/{}/sorting-with-rayon", id));
    assert_eq!(app.store.tag_names(id), vec!["rust", "rayon"]);

    let deleted = app.cache.deleted_keys();
    assert!(!deleted.is_empty());
    assert!(deleted.iter().all(|key| key == "questions"));

    let listing = app.server.get("/questions").await.json::<Value>();
    assert_eq!(app.store.list_reads(), 2);
    assert_eq!(listing["items"][0]["id"], id);
    assert_eq!(listing["total"], 3);
}

#[tokio::test]
async fn test_create_invalid_payload_changes_nothing() {
    let app = test_app();

    let response = app
        .server
        .post("/questions")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({ "title": "Hi", "body": "short", "tags": ["bad tag"] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["details"].get("title").is_some());
    assert!(json["error"]["details"].get("body").is_some());
    assert!(app.cache.deleted_keys().is_empty());
}

#[tokio::test]
async fn test_create_title_without_slug_rejected() {
    let app = test_app();

    let response = app
        .server
        .post("/questions")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("???", &[]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(app.cache.deleted_keys().is_empty());
}

// ─── EDIT ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_edit_form_for_owner() {
    let app = test_app();

    let response = app
        .server
        .get("/questions/5/how-to-sort/edit")
        .authorization_bearer(ALICE_TOKEN)
        .await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["question"]["title"], "How to sort");
    assert_eq!(json["tags"], "rust, sorting");
}

#[tokio::test]
async fn test_edit_form_gate_checked_before_slug() {
    let app = test_app();

    let response = app
        .server
        .get("/questions/5/stale-slug/edit")
        .authorization_bearer(BOB_TOKEN)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_edit_form_wrong_slug_for_owner() {
    let app = test_app();

    let response = app
        .server
        .get("/questions/5/stale-slug/edit")
        .authorization_bearer(ALICE_TOKEN)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// ─── UPDATE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_renames_and_invalidates() {
    let app = test_app();

    // Warm both cached views
    app.server.get("/questions").await.assert_status_ok();
    app.server.get("/questions/5/how-to-sort").await.assert_status_ok();

    let response = app
        .server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("How To Sort Fast", &["rust", "performance"]))
        .await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["question"]["title"], "How To Sort Fast");
    assert_eq!(json["question"]["slug"], "how-to-sort-fast");
    assert_eq!(json["url"], "/questions/5/how-to-sort-fast");

    let deleted = app.cache.deleted_keys();
    assert!(deleted.contains(&"questions".to_string()));
    assert!(deleted.contains(&"question-5".to_string()));

    // Old slug is gone, new slug serves fresh data
    app.server
        .get("/questions/5/how-to-sort")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let fresh = app.server.get("/questions/5/how-to-sort-fast").await;
    fresh.assert_status_ok();
    let fresh = fresh.json::<Value>();
    assert_eq!(fresh["question"]["title"], "How To Sort Fast");
    assert_eq!(fresh["question"]["tags"][1]["name"], "performance");
    assert_eq!(app.store.detail_reads(), 2);
}

#[tokio::test]
async fn test_listing_reflects_update() {
    let app = test_app();

    app.server.get("/questions").await.assert_status_ok();

    app.server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("How To Sort Fast", &[]))
        .await
        .assert_status_ok();

    let listing = app.server.get("/questions").await.json::<Value>();
    let row = listing["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["id"] == 5)
        .unwrap();

    assert_eq!(row["title"], "How To Sort Fast");
    assert_eq!(row["slug"], "how-to-sort-fast");
    assert_eq!(app.store.list_reads(), 2);
}

#[tokio::test]
async fn test_update_by_non_owner_forbidden() {
    let app = test_app();

    app.server.get("/questions/5/how-to-sort").await.assert_status_ok();

    let response = app
        .server
        .put("/questions/5")
        .authorization_bearer(BOB_TOKEN)
        .json(&payload("Hijacked title", &[]))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "forbidden");

    assert_eq!(app.store.question(5).unwrap().title, "How to sort");
    assert!(app.cache.deleted_keys().is_empty());
    assert!(app.cache.contains("question-5").await);
}

#[tokio::test]
async fn test_update_missing_question_not_found() {
    let app = test_app();

    let response = app
        .server
        .put("/questions/999")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("Whatever title", &[]))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(app.cache.deleted_keys().is_empty());
}

#[tokio::test]
async fn test_update_invalid_payload_changes_nothing() {
    let app = test_app();

    let response = app
        .server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&json!({ "title": "How to sort", "body": "tiny" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store.question(5).unwrap().body, "Body of How to sort");
    assert!(app.cache.deleted_keys().is_empty());
}

// ─── DELETE ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_by_non_owner_forbidden() {
    let app = test_app();

    app.server.get("/questions").await.assert_status_ok();

    let response = app
        .server
        .delete("/questions/7")
        .authorization_bearer(BOB_TOKEN)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    assert!(app.store.question(7).is_some());
    assert!(app.store.has_tag_rows(7));
    assert!(app.cache.deleted_keys().is_empty());
    assert!(app.cache.contains("questions").await);
}

#[tokio::test]
async fn test_delete_detaches_tags_and_invalidates() {
    let app = test_app();

    app.server.get("/questions").await.assert_status_ok();
    app.server.get("/questions/5/how-to-sort").await.assert_status_ok();

    let response = app
        .server
        .delete("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .await;

    response.assert_status(StatusCode::NO_CONTENT);

    assert!(app.store.question(5).is_none());
    assert!(!app.store.has_tag_rows(5));

    let deleted = app.cache.deleted_keys();
    assert!(deleted.contains(&"questions".to_string()));
    assert!(deleted.contains(&"question-5".to_string()));

    app.server
        .get("/questions/5/how-to-sort")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listing = app.server.get("/questions").await.json::<Value>();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["id"], 7);
}

#[tokio::test]
async fn test_delete_missing_question_not_found() {
    let app = test_app();

    let response = app
        .server
        .delete("/questions/999")
        .authorization_bearer(ALICE_TOKEN)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(app.cache.deleted_keys().is_empty());
}

// ─── PARTIAL FAILURES ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_with_failing_tag_sync_serves_no_stale_detail() {
    let app = test_app();

    app.server.get("/questions").await.assert_status_ok();
    app.server.get("/questions/5/how-to-sort").await.assert_status_ok();
    app.store.break_tag_sync();

    let response = app
        .server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("How To Sort Fast", &["rust"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    // The row was rewritten before the tags failed.
    assert_eq!(app.store.question(5).unwrap().title, "How To Sort Fast");

    let detail = app.server.get("/questions/5/how-to-sort-fast").await;
    detail.assert_status_ok();
    assert_eq!(detail.json::<Value>()["question"]["title"], "How To Sort Fast");

    assert_eq!(
        listed_title(&app.server, 5).await.as_deref(),
        Some("How To Sort Fast")
    );
}

#[tokio::test]
async fn test_create_with_failing_tag_sync_refreshes_listing() {
    let app = test_app();

    app.server.get("/questions").await.assert_status_ok();
    app.store.break_tag_sync();

    let response = app
        .server
        .post("/questions")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("Sorting with Rayon", &["rayon"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let listing = app.server.get("/questions").await.json::<Value>();
    assert_eq!(listing["total"], 3);
    assert_eq!(listing["items"][0]["title"], "Sorting with Rayon");
}

#[tokio::test]
async fn test_update_with_failing_cache_after_write_serves_no_stale_data() {
    // Both deletes before the write succeed, the ones after it fail.
    let (server, store) = flaky_server(2);

    server.get("/questions").await.assert_status_ok();
    server.get("/questions/5/how-to-sort").await.assert_status_ok();

    let response = server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("How To Sort Fast", &["rust"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.question(5).unwrap().title, "How To Sort Fast");

    let detail = server.get("/questions/5/how-to-sort-fast").await;
    detail.assert_status_ok();
    assert_eq!(detail.json::<Value>()["question"]["title"], "How To Sort Fast");

    assert_eq!(
        listed_title(&server, 5).await.as_deref(),
        Some("How To Sort Fast")
    );
}

#[tokio::test]
async fn test_create_with_failing_cache_after_write_refreshes_listing() {
    let (server, store) = flaky_server(1);

    server.get("/questions").await.assert_status_ok();

    let response = server
        .post("/questions")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("Sorting with Rayon", &["rayon"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.list_reads(), 1);

    let listing = server.get("/questions").await.json::<Value>();
    assert_eq!(store.list_reads(), 2);
    assert_eq!(listing["total"], 3);
    assert_eq!(listing["items"][0]["title"], "Sorting with Rayon");
}

#[tokio::test]
async fn test_write_not_attempted_when_cache_rejects_invalidation() {
    let (server, store) = flaky_server(0);

    server.get("/questions").await.assert_status_ok();

    let response = server
        .put("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .json(&payload("How To Sort Fast", &["rust"]))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.question(5).unwrap().title, "How to sort");
    assert_eq!(store.tag_names(5), vec!["rust", "sorting"]);

    server
        .get("/questions/5/how-to-sort")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_delete_with_failing_cache_after_write_drops_cached_views() {
    let (server, store) = flaky_server(2);

    server.get("/questions").await.assert_status_ok();
    server.get("/questions/5/how-to-sort").await.assert_status_ok();

    let response = server
        .delete("/questions/5")
        .authorization_bearer(ALICE_TOKEN)
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.question(5).is_none());
    assert!(!store.has_tag_rows(5));

    server
        .get("/questions/5/how-to-sort")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(listed_title(&server, 5).await, None);
}
