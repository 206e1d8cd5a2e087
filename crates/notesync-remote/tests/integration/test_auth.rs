//! Integration tests for token refresh on HTTP 401
//!
//! Verifies that a rejected request is retried once with the refreshed
//! token and that later requests keep using it.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notesync_core::domain::{Revision, SyncError};
use notesync_core::ports::IRemoteNotes;
use notesync_remote::{HttpRemoteNotes, NotesApiClient, StaticTokenProvider};

async fn refreshing_remote(server: &MockServer) -> HttpRemoteNotes {
    let client = NotesApiClient::with_base_url("expired", server.uri())
        .with_token_provider(Arc::new(StaticTokenProvider::new("fresh")));
    HttpRemoteNotes::new(client)
}

#[tokio::test]
async fn test_401_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [],
            "revision": 8
        })))
        .expect(2)
        .mount(&server)
        .await;

    let remote = refreshing_remote(&server).await;

    let result = remote.fetch_all().await.expect("retried request succeeds");
    assert_eq!(result.revision, Revision::new(8));
    assert_eq!(remote.client().token(), "fresh");

    // the next call goes straight out with the new token
    remote.fetch_all().await.unwrap();
    let refresher = remote.client().refresher().unwrap();
    assert_eq!(refresher.refresh_count(), 1);
}

#[tokio::test]
async fn test_401_after_refresh_surfaces_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let remote = refreshing_remote(&server).await;

    assert_eq!(remote.fetch_all().await.unwrap_err(), SyncError::Unauthorized);
    assert_eq!(remote.client().refresher().unwrap().refresh_count(), 1);
}

#[tokio::test]
async fn test_mutation_is_replayed_with_body_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/list"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/list"))
        .and(header("Authorization", "Bearer fresh"))
        .and(header("X-Last-Known-Revision", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "element": {
                "id": "n1",
                "text": "Buy milk\n",
                "importance": "basic",
                "done": false,
                "created_at": 1_700_000_000_000_i64,
                "last_updated_by": "device-1"
            },
            "revision": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = refreshing_remote(&server).await;
    let note = notesync_core::domain::Note::new_with_id(
        "n1".parse().unwrap(),
        "Buy milk",
        "",
        "device-1",
    );

    let result = remote.create(&note, Revision::new(3)).await.unwrap();
    assert_eq!(result.revision, Revision::new(4));
}
