//! Handlers for resolutions.
//!
//! Nested under `/api/requests/{id}/resolution` for the single-request
//! operations, plus a batch read at `/api/resolutions?request_ids=1,2,3`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use fixit_core::{
  ops,
  resolution::{NewResolution, Resolution},
  store::RequestStore,
};

use crate::{
  AppState,
  auth::{Authed, MaybeAuthed},
  error::ApiError,
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub admin_notes:          Option<String>,
  pub technician_photo_url: Option<String>,
}

/// `POST /api/requests/{id}/resolution` — assigned technician only; resolves
/// the request in the same transaction.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let input = NewResolution {
    admin_notes:          body.admin_notes,
    technician_photo_url: body.technician_photo_url,
  };
  let resolution =
    ops::create_resolution(&*state.store, &principal, id, input).await?;
  Ok((StatusCode::CREATED, Json(resolution)))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /api/requests/{id}/resolution` — 404 until the request is resolved.
pub async fn get_for_request<S>(
  State(state): State<AppState<S>>,
  MaybeAuthed(principal): MaybeAuthed,
  Path(id): Path<i64>,
) -> Result<Json<Resolution>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let resolution =
    ops::get_resolution(&*state.store, principal.as_ref(), id).await?;
  Ok(Json(resolution))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Comma-separated request ids.
  pub request_ids: String,
}

/// `GET /api/resolutions?request_ids=1,2,3` — ids without a resolution
/// contribute nothing to the result.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  MaybeAuthed(principal): MaybeAuthed,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Resolution>>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let ids = params
    .request_ids
    .split(',')
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(|t| {
      t.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid request id: {t:?}")))
    })
    .collect::<Result<Vec<_>, _>>()?;

  let resolutions =
    ops::list_resolutions(&*state.store, principal.as_ref(), ids).await?;
  Ok(Json(resolutions))
}

// ─── Append notes ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotesBody {
  pub admin_notes: String,
}

/// `PATCH /api/requests/{id}/resolution` — admin note append, the only
/// mutation a resolution ever sees.
pub async fn append_notes<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
  Json(body): Json<NotesBody>,
) -> Result<Json<Resolution>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let resolution =
    ops::append_resolution_notes(&*state.store, &principal, id, body.admin_notes)
      .await?;
  Ok(Json(resolution))
}
