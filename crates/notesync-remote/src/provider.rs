//! HttpRemoteNotes - IRemoteNotes implementation for the notes API
//!
//! Maps each port operation to one request on `/list` or `/list/{id}` and
//! converts envelopes into revisioned domain values. Retry and recovery
//! policy live in the sync crate; this adapter sends exactly one request
//! per call (plus the authenticated retry handled by the client).

use reqwest::Method;
use tracing::debug;
use url::Url;

use notesync_core::domain::{Note, NoteId, Revision, SyncError};
use notesync_core::ports::{IRemoteNotes, Revisioned};

use crate::client::{NotesApiClient, REVISION_HEADER};
use crate::dto::{
    notes_from_dtos, ElementRequest, ElementResponse, ListRequest, ListResponse, NoteDto,
};

/// Remote note list reached over HTTP
#[derive(Debug)]
pub struct HttpRemoteNotes {
    client: NotesApiClient,
}

impl HttpRemoteNotes {
    pub fn new(client: NotesApiClient) -> Self {
        Self { client }
    }

    /// Returns the underlying API client
    pub fn client(&self) -> &NotesApiClient {
        &self.client
    }

    /// `/list/{id}` with the id percent-encoded as one path segment
    fn element_path(id: &NoteId) -> Result<String, SyncError> {
        let invalid = || SyncError::Unknown(format!("cannot build a path for note id {id}"));
        let mut url = Url::parse("http://notes.invalid/list").map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .push(id.as_str());
        Ok(url.path().to_string())
    }

    async fn send_element(
        &self,
        method: Method,
        path: &str,
        revision: Revision,
        body: Option<ElementRequest>,
    ) -> Result<Revisioned<Note>, SyncError> {
        let mut builder = self
            .client
            .request(method, path)
            .header(REVISION_HEADER, revision.value());
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response: ElementResponse = self.client.send_json(builder, true).await?;
        let note = Note::try_from(response.element)?;
        Ok(Revisioned::new(note, Revision::new(response.revision)))
    }
}

#[async_trait::async_trait]
impl IRemoteNotes for HttpRemoteNotes {
    async fn fetch_all(&self) -> Result<Revisioned<Vec<Note>>, SyncError> {
        let response: ListResponse = self
            .client
            .send_json(self.client.request(Method::GET, "/list"), false)
            .await?;

        debug!(
            count = response.list.len(),
            revision = response.revision,
            "Fetched note list"
        );
        Ok(Revisioned::new(
            notes_from_dtos(response.list)?,
            Revision::new(response.revision),
        ))
    }

    async fn fetch_one(&self, id: &NoteId) -> Result<Revisioned<Note>, SyncError> {
        let response: ElementResponse = self
            .client
            .send_json(
                self.client.request(Method::GET, &Self::element_path(id)?),
                false,
            )
            .await?;

        let note = Note::try_from(response.element)?;
        Ok(Revisioned::new(note, Revision::new(response.revision)))
    }

    async fn create(
        &self,
        note: &Note,
        revision: Revision,
    ) -> Result<Revisioned<Note>, SyncError> {
        debug!(note_id = %note.id(), %revision, "Creating note");
        self.send_element(
            Method::POST,
            "/list",
            revision,
            Some(ElementRequest {
                element: NoteDto::from(note),
            }),
        )
        .await
    }

    async fn update(
        &self,
        note: &Note,
        revision: Revision,
    ) -> Result<Revisioned<Note>, SyncError> {
        debug!(note_id = %note.id(), %revision, "Updating note");
        self.send_element(
            Method::PUT,
            &Self::element_path(note.id())?,
            revision,
            Some(ElementRequest {
                element: NoteDto::from(note),
            }),
        )
        .await
    }

    async fn delete(
        &self,
        id: &NoteId,
        revision: Revision,
    ) -> Result<Revisioned<Note>, SyncError> {
        debug!(note_id = %id, %revision, "Deleting note");
        self.send_element(Method::DELETE, &Self::element_path(id)?, revision, None)
            .await
    }

    async fn patch_all(
        &self,
        notes: &[Note],
        revision: Revision,
    ) -> Result<Revisioned<Vec<Note>>, SyncError> {
        debug!(count = notes.len(), %revision, "Patching note list");
        let body = ListRequest {
            list: notes.iter().map(NoteDto::from).collect(),
        };
        let builder = self
            .client
            .request(Method::PATCH, "/list")
            .header(REVISION_HEADER, revision.value())
            .json(&body);

        let response: ListResponse = self.client.send_json(builder, true).await?;
        Ok(Revisioned::new(
            notes_from_dtos(response.list)?,
            Revision::new(response.revision),
        ))
    }
}
