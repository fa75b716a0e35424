//! Handlers for accounts: open signup plus admin-gated user management.
//!
//! Passwords are hashed here, at the transport boundary; the core and the
//! store only ever see the PHC string.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use fixit_core::{
  ops,
  store::RequestStore,
  user::{NewUser, Role, Signup, User},
};

use crate::{AppState, auth, auth::Authed, error::ApiError};

// ─── Signup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub username: String,
  pub email:    String,
  pub password: String,
  /// Whatever the payload asked for; anything but STUDENT is refused.
  pub role:     Option<Role>,
}

/// `POST /api/signup` — the open registration path. Always a STUDENT.
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let password_hash = auth::hash_password(&body.password)?;
  let user = ops::sign_up(&*state.store, Signup {
    username:       body.username,
    email:          body.email,
    password_hash,
    requested_role: body.role,
  })
  .await?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Admin user management ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  pub email:    String,
  pub password: String,
  pub role:     Role,
}

/// `POST /api/users` — admin-only; the one path that mints TECHNICIAN and
/// ADMIN accounts.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let password_hash = auth::hash_password(&body.password)?;
  let user = ops::create_user(&*state.store, &principal, NewUser {
    username: body.username,
    email:    body.email,
    role:     body.role,
    password_hash,
  })
  .await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let users = ops::list_users(&*state.store, &principal).await?;
  Ok(Json(users))
}

/// `GET /api/users/{id}` — admin or self.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authed(principal): Authed,
  Path(id): Path<i64>,
) -> Result<Json<User>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let user = ops::get_user(&*state.store, &principal, id).await?;
  Ok(Json(user))
}
