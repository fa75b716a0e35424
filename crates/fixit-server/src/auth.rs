//! HTTP Basic-auth extractors — the identity layer in front of the core.
//!
//! Credentials are an email plus password, verified against the stored
//! argon2 PHC string. Handlers receive an already-resolved
//! [`Principal`]; the core never sees a password or a session.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use fixit_core::{Error as CoreError, store::RequestStore, user::Principal};

use crate::{AppState, error::ApiError};

/// Present in a handler's arguments means the request carried valid
/// credentials.
pub struct Authed(pub Principal);

/// Like [`Authed`] but tolerates a missing Authorization header — for the
/// public read routes, where an anonymous caller is fine but garbage
/// credentials still get a 401.
pub struct MaybeAuthed(pub Option<Principal>);

fn unauthorized() -> ApiError {
  ApiError::Core(CoreError::Unauthenticated)
}

/// Hash a password into an argon2 PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|_| ApiError::Hash)?
      .to_string(),
  )
}

/// Decode the Basic header into `(email, password)`; `Ok(None)` when the
/// header is absent entirely.
fn parse_basic(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| unauthorized())?;
  let encoded = value.strip_prefix("Basic ").ok_or_else(unauthorized)?;
  let decoded = B64.decode(encoded).map_err(|_| unauthorized())?;
  let creds = String::from_utf8(decoded).map_err(|_| unauthorized())?;
  let (email, password) = creds.split_once(':').ok_or_else(unauthorized)?;
  Ok(Some((email.to_owned(), password.to_owned())))
}

/// Resolve the credentials in `headers` to a [`Principal`], if any are
/// present.
async fn resolve_principal<S>(
  headers: &HeaderMap,
  state: &AppState<S>,
) -> Result<Option<Principal>, ApiError>
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  let Some((email, password)) = parse_basic(headers)? else {
    return Ok(None);
  };

  let user = state
    .store
    .find_user_by_email(email)
    .await
    .map_err(|e| ApiError::Core(e.into()))?
    .ok_or_else(unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&user.password_hash).map_err(|_| unauthorized())?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| unauthorized())?;

  Ok(Some(user.principal()))
}

impl<S> FromRequestParts<AppState<S>> for Authed
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match resolve_principal(&parts.headers, state).await? {
      Some(principal) => Ok(Authed(principal)),
      None => Err(unauthorized()),
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeAuthed
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeAuthed(resolve_principal(&parts.headers, state).await?))
  }
}
