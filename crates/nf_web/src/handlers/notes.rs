use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use nf_core::{ArticleId, AuthUser, Error, Note, NoteId, Result};
use serde::Deserialize;

use super::{owned_article, Message};
use crate::extract::{ApiJson, ApiPath};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub content: Option<String>,
}

impl NoteBody {
    fn content(&self) -> Result<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::bad_request("content is required"))
    }
}

async fn note_of_article(state: &AppState, article_id: ArticleId, note_id: NoteId) -> Result<Note> {
    state
        .storage
        .notes
        .find_note(note_id)
        .await?
        .filter(|note| note.article_id == article_id)
        .ok_or_else(|| Error::not_found("Note not found"))
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    ApiPath(article_id): ApiPath<ArticleId>,
) -> std::result::Result<Json<Vec<Note>>, ApiError> {
    let notes = state.storage.notes.list_by_article(article_id).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(article_id): ApiPath<ArticleId>,
    ApiJson(body): ApiJson<NoteBody>,
) -> std::result::Result<(StatusCode, Json<Note>), ApiError> {
    owned_article(&state, &user, article_id).await?;
    let content = body.content()?;
    let note = state.storage.notes.create_note(article_id, content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath((article_id, note_id)): ApiPath<(ArticleId, NoteId)>,
    ApiJson(body): ApiJson<NoteBody>,
) -> std::result::Result<Json<Note>, ApiError> {
    owned_article(&state, &user, article_id).await?;
    note_of_article(&state, article_id, note_id).await?;
    let content = body.content()?;
    let note = state.storage.notes.update_note(note_id, content).await?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath((article_id, note_id)): ApiPath<(ArticleId, NoteId)>,
) -> std::result::Result<Json<Message>, ApiError> {
    owned_article(&state, &user, article_id).await?;
    note_of_article(&state, article_id, note_id).await?;
    state.storage.notes.delete_note(note_id).await?;
    Ok(Json(Message {
        message: "Note deleted",
    }))
}
