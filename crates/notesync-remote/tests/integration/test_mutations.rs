//! Integration tests for the mutating endpoints
//!
//! Verifies the revision header, request bodies and out-of-sync detection.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use notesync_core::domain::{Note, NoteColor, Revision, SyncError};
use notesync_core::ports::IRemoteNotes;

use crate::common;

fn buy_milk() -> Note {
    Note::new_with_id("n1".parse().unwrap(), "Buy milk", "", "device-1")
}

#[tokio::test]
async fn test_create_sends_revision_and_element() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("POST"))
        .and(path("/list"))
        .and(header("X-Last-Known-Revision", "4"))
        .and(body_partial_json(json!({
            "element": {
                "id": "n1",
                "text": "Buy milk\n",
                "importance": "basic",
                "done": false,
                "last_updated_by": "device-1"
            }
        })))
        .respond_with(common::element_response(
            common::note_json("n1", "Buy milk\n"),
            5,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote.create(&buy_milk(), Revision::new(4)).await.unwrap();
    assert_eq!(result.revision, Revision::new(5));
    assert_eq!(result.value.id().as_str(), "n1");
}

#[tokio::test]
async fn test_update_puts_to_element_path() {
    let (server, remote) = common::setup_notes_mock().await;
    let mut note = buy_milk();
    note.set_color(NoteColor::from_rgb(0xFF0000));

    Mock::given(method("PUT"))
        .and(path("/list/n1"))
        .and(header("X-Last-Known-Revision", "5"))
        .and(body_partial_json(json!({ "element": { "color": "#FF0000" } })))
        .respond_with(common::element_response(
            common::note_json("n1", "Buy milk\n"),
            6,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote.update(&note, Revision::new(5)).await.unwrap();
    assert_eq!(result.revision, Revision::new(6));
}

#[tokio::test]
async fn test_delete_returns_new_revision() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/list/n1"))
        .and(header("X-Last-Known-Revision", "6"))
        .respond_with(common::element_response(
            common::note_json("n1", "Buy milk\n"),
            7,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote
        .delete(&"n1".parse().unwrap(), Revision::new(6))
        .await
        .unwrap();
    assert_eq!(result.revision, Revision::new(7));
}

#[tokio::test]
async fn test_patch_all_replaces_list() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("PATCH"))
        .and(path("/list"))
        .and(header("X-Last-Known-Revision", "2"))
        .and(body_partial_json(json!({ "list": [ { "id": "n1" } ] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "list": [common::note_json("n1", "Buy milk\n")],
            "revision": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote.patch_all(&[buy_milk()], Revision::new(2)).await.unwrap();
    assert_eq!(result.revision, Revision::new(3));
    assert_eq!(result.value.len(), 1);
}

#[tokio::test]
async fn test_out_of_sync_marker_is_detected() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/list/n1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unsynchronized data"))
        .mount(&server)
        .await;

    let err = remote
        .delete(&"n1".parse().unwrap(), Revision::new(5))
        .await
        .unwrap_err();
    assert_eq!(err, SyncError::OutOfSync);
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn test_plain_bad_request_is_remote_failure() {
    let (server, remote) = common::setup_notes_mock().await;
    Mock::given(method("POST"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(400).set_body_string("duplicate id"))
        .mount(&server)
        .await;

    let err = remote.create(&buy_milk(), Revision::new(1)).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn test_element_path_escapes_reserved_characters() {
    let (server, remote) = common::setup_notes_mock().await;
    let id = "a?b#c%d";
    Mock::given(method("DELETE"))
        .and(path("/list/a%3Fb%23c%25d"))
        .and(header("X-Last-Known-Revision", "2"))
        .respond_with(common::element_response(common::note_json(id, "Odd id\n"), 3))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote
        .delete(&id.parse().unwrap(), Revision::new(2))
        .await
        .unwrap();
    assert_eq!(result.revision, Revision::new(3));
    assert_eq!(result.value.id().as_str(), id);
}
