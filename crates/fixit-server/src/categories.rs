//! Handlers for `/api/categories`. Reads are public; writes are admin-only.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use fixit_core::{category::Category, ops, store::RequestStore};

use crate::{AppState, auth::Authed, error::ApiError};

/// `GET /api/categories`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let categories = ops::list_categories(&*state.store).await?;
  Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /api/categories`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let category =
    ops::create_category(&*state.store, &principal, body.name).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `DELETE /api/categories/{id}` — requests referencing the category keep
/// existing with their `category_id` cleared.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  ops::delete_category(&*state.store, &principal, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
