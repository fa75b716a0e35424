//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! The interesting taxonomy lives in [`fixit_core::Error`]; this type only
//! adds transport-level rejections and the HTTP status mapping. Denials
//! carry their reason code in the body so callers can tell `not_owner` from
//! `not_assignee`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use fixit_core::Error as CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("password hashing failed")]
  Hash,
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Hash => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Core(e) => match e {
        CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::RequestNotFound(_)
        | CoreError::UserNotFound(_)
        | CoreError::CategoryNotFound(_)
        | CoreError::ResolutionNotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Validation(_)
        | CoreError::InvalidTransition { .. }
        | CoreError::InvalidReference(_) => StatusCode::BAD_REQUEST,
        CoreError::DuplicateResolution(_) | CoreError::EmailTaken(_) => {
          StatusCode::CONFLICT
        }
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();

    // Store failures stay generic; their detail goes to the log, not the
    // client.
    let message = match &self {
      ApiError::Core(CoreError::Store(e)) => {
        tracing::error!("store error: {e}");
        "internal error".to_string()
      }
      other => other.to_string(),
    };

    let mut body = json!({ "error": message });
    if let ApiError::Core(CoreError::Forbidden(deny)) = &self {
      body["reason"] = json!(deny.as_str());
    }

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"fixit\""),
      );
    }
    res
  }
}
