//! Integration tests for the read endpoints
//!
//! Verifies `fetch_all` and `fetch_one` decoding and the mapping of
//! failures to the error taxonomy.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use notesync_core::config::RemoteConfig;
use notesync_core::domain::{Revision, SyncError};
use notesync_core::ports::IRemoteNotes;
use notesync_remote::{HttpRemoteNotes, NotesApiClient};

use crate::common;

#[tokio::test]
async fn test_fetch_all_decodes_list_and_revision() {
    let (server, remote) = common::setup_notes_mock().await;
    common::mount_list(
        &server,
        json!([
            common::note_json("n1", "Buy milk\n"),
            common::note_json("n2", "Call mom\nafter work"),
        ]),
        6,
    )
    .await;

    let result = remote.fetch_all().await.expect("fetch_all failed");

    assert_eq!(result.revision, Revision::new(6));
    assert_eq!(result.value.len(), 2);
    assert_eq!(result.value[0].id().as_str(), "n1");
    assert_eq!(result.value[0].title(), "Buy milk");
    assert_eq!(result.value[1].body(), "after work");
}

#[tokio::test]
async fn test_fetch_sends_bearer_token() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [],
            "revision": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote.fetch_all().await.unwrap();
    assert!(result.value.is_empty());
}

#[tokio::test]
async fn test_fetch_one() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list/n1"))
        .respond_with(common::element_response(
            common::note_json("n1", "Only title"),
            9,
        ))
        .mount(&server)
        .await;

    let result = remote.fetch_one(&"n1".parse().unwrap()).await.unwrap();
    assert_eq!(result.revision, Revision::new(9));
    assert_eq!(result.value.title(), "Only title");
    assert_eq!(result.value.body(), "");
}

#[tokio::test]
async fn test_server_error_maps_to_remote_failure() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = remote.fetch_all().await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Remote {
            status: 500,
            message: "boom".into()
        }
    );
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_unauthorized_without_refresher() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert_eq!(remote.fetch_all().await.unwrap_err(), SyncError::Unauthorized);
}

#[tokio::test]
async fn test_malformed_body_is_unknown() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        remote.fetch_all().await.unwrap_err(),
        SyncError::Unknown(_)
    ));
}

#[tokio::test]
async fn test_slow_server_is_network_timeout() {
    let (server, _) = common::setup_notes_mock().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "list": [], "revision": 1 }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = RemoteConfig {
        base_url: server.uri(),
        request_timeout_secs: 1,
        ..RemoteConfig::default()
    };
    let remote = HttpRemoteNotes::new(NotesApiClient::from_config(&config, "t").unwrap());

    let err = remote.fetch_all().await.unwrap_err();
    assert!(matches!(err, SyncError::NetworkTimeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_network_timeout() {
    // Nothing listens on the discard port.
    let remote = HttpRemoteNotes::new(NotesApiClient::with_base_url("t", "http://127.0.0.1:9"));
    let err = remote.fetch_all().await.unwrap_err();
    assert!(matches!(err, SyncError::NetworkTimeout(_)), "got {err:?}");
}

#[tokio::test]
async fn test_generate_fails_header_is_sent() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("X-Generate-Fails", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [],
            "revision": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = NotesApiClient::with_base_url("t", server.uri()).with_generate_fails(Some(25));
    let remote = HttpRemoteNotes::new(client);
    assert_eq!(remote.fetch_all().await.unwrap().revision, Revision::new(3));
}
