//! Shared test helpers for notes API integration tests
//!
//! Each helper mounts the mock endpoints a test needs on a wiremock server.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notesync_remote::{HttpRemoteNotes, NotesApiClient};

/// Starts a mock server and returns it with an adapter pointing at it
pub async fn setup_notes_mock() -> (MockServer, HttpRemoteNotes) {
    let server = MockServer::start().await;
    let client = NotesApiClient::with_base_url("test-token", server.uri());
    (server, HttpRemoteNotes::new(client))
}

/// Wire representation of a note as the server would send it
pub fn note_json(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "text": text,
        "importance": "basic",
        "done": false,
        "created_at": 1_700_000_000_000_i64,
        "changed_at": 1_700_000_000_000_i64,
        "last_updated_by": "server"
    })
}

/// Mounts `GET /list` returning `items` at `revision`
pub async fn mount_list(server: &MockServer, items: Value, revision: i64) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "list": items,
            "revision": revision
        })))
        .mount(server)
        .await;
}

/// Element envelope used by POST/PUT/DELETE responses
pub fn element_response(element: Value, revision: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "ok",
        "element": element,
        "revision": revision
    }))
}
