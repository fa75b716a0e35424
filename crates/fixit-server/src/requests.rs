//! Handlers for `/api/requests`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/requests` | Public; filters/sort/page via query string |
//! | `POST`   | `/api/requests` | Authenticated; ownership forced server-side |
//! | `GET`    | `/api/requests/{id}` | Public; 404 if not found |
//! | `PATCH`  | `/api/requests/{id}` | Owner or admin |
//! | `DELETE` | `/api/requests/{id}` | Owner or admin; cascades the resolution |
//! | `PUT`    | `/api/requests/{id}/assignee` | Admin |
//! | `PUT`    | `/api/requests/{id}/status` | Admin or assigned technician |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use fixit_core::{
  ops,
  query::{Page, PageParams, RequestFilter, RequestQuery, Sort},
  request::{Request, RequestDraft, RequestPatch, Status, Urgency},
  store::RequestStore,
};

use crate::{
  AppState,
  auth::{Authed, MaybeAuthed},
  error::ApiError,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Raw query-string parameters, coerced into the typed query exactly once.
/// Unknown keys are rejected rather than silently ignored.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListParams {
  pub status:      Option<Status>,
  pub urgency:     Option<Urgency>,
  pub category_id: Option<i64>,
  pub user_id:     Option<i64>,
  pub assigned_to: Option<i64>,
  pub q:           Option<String>,
  pub sort:        Option<String>,
  pub order:       Option<String>,
  pub page:        Option<u32>,
  pub page_size:   Option<u32>,
}

/// `GET /api/requests[?status=..&urgency=..&q=..&sort=..&order=..&page=..&page_size=..]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  MaybeAuthed(principal): MaybeAuthed,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Request>>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let query = RequestQuery {
    filter: RequestFilter {
      status:      params.status,
      urgency:     params.urgency,
      category_id: params.category_id,
      user_id:     params.user_id,
      assigned_to: params.assigned_to,
      q:           params.q,
    },
    sort:   Sort::from_params(params.sort.as_deref(), params.order.as_deref()),
    page:   PageParams::new(params.page, params.page_size),
  };

  let page = ops::list_requests(&*state.store, principal.as_ref(), query).await?;
  Ok(Json(page))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub urgency:     Urgency,
  pub category_id: Option<i64>,
  pub photo_url:   Option<String>,
  /// Accepted for wire compatibility and discarded — ownership always comes
  /// from the authenticated principal.
  #[serde(default)]
  pub user_id:     Option<i64>,
}

/// `POST /api/requests`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let _ = body.user_id; // discarded

  let draft = RequestDraft {
    title:       body.title,
    description: body.description,
    location:    body.location,
    urgency:     body.urgency,
    category_id: body.category_id,
    photo_url:   body.photo_url,
  };

  let request = ops::create_request(&*state.store, &principal, draft).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/requests/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  MaybeAuthed(principal): MaybeAuthed,
  Path(id): Path<i64>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let request = ops::get_request(&*state.store, principal.as_ref(), id).await?;
  Ok(Json(request))
}

// ─── Update content ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub urgency:     Option<Urgency>,
  pub photo_url:   Option<String>,
}

/// `PATCH /api/requests/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let patch = RequestPatch {
    title:       body.title,
    description: body.description,
    location:    body.location,
    urgency:     body.urgency,
    photo_url:   body.photo_url,
  };

  let request =
    ops::update_request_content(&*state.store, &principal, id, patch).await?;
  Ok(Json(request))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/requests/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let deleted = ops::delete_request(&*state.store, &principal, id).await?;
  Ok(Json(json!({ "id": deleted })))
}

// ─── Assign ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub technician_id: i64,
}

/// `PUT /api/requests/{id}/assignee`
pub async fn assign<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let request =
    ops::assign_request(&*state.store, &principal, id, body.technician_id)
      .await?;
  Ok(Json(request))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: Status,
}

/// `PUT /api/requests/{id}/status`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Request>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let request =
    ops::update_status(&*state.store, &principal, id, body.status).await?;
  Ok(Json(request))
}
