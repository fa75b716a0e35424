//! Error type for `fixit-store-sqlite`.
//!
//! Domain conditions discovered inside a transaction (missing rows, invalid
//! transitions, uniqueness violations) get their own variants so the
//! conversion into [`fixit_core::Error`] stays lossless; only genuine
//! database failures collapse into the core's opaque store error.

use thiserror::Error;

use fixit_core::{lifecycle::TransitionError, policy::Deny};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("cannot decode column value: {0}")]
  Decode(String),

  #[error("request not found: {0}")]
  RequestNotFound(i64),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("category not found: {0}")]
  CategoryNotFound(i64),

  #[error("no resolution recorded for request {0}")]
  ResolutionNotFound(i64),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("request {0} already has a resolution")]
  DuplicateResolution(i64),

  #[error("user {0} does not exist or is not a technician")]
  InvalidAssignee(i64),

  #[error("category {0} does not exist")]
  InvalidCategory(i64),

  /// Policy re-check inside the write transaction failed.
  #[error("forbidden: {0}")]
  Forbidden(Deny),

  #[error(transparent)]
  Transition(#[from] TransitionError),
}

impl From<Error> for fixit_core::Error {
  fn from(e: Error) -> Self {
    use fixit_core::Error as Core;
    match e {
      Error::RequestNotFound(id) => Core::RequestNotFound(id),
      Error::UserNotFound(id) => Core::UserNotFound(id),
      Error::CategoryNotFound(id) => Core::CategoryNotFound(id),
      Error::ResolutionNotFound(id) => Core::ResolutionNotFound(id),
      Error::EmailTaken(email) => Core::EmailTaken(email),
      Error::DuplicateResolution(id) => Core::DuplicateResolution(id),
      Error::InvalidAssignee(id) => Core::InvalidReference(format!(
        "user {id} does not exist or is not a technician"
      )),
      Error::InvalidCategory(id) => {
        Core::InvalidReference(format!("category {id} does not exist"))
      }
      Error::Forbidden(deny) => deny.into(),
      Error::Transition(t) => t.into(),
      e @ (Error::Database(_) | Error::DateParse(_) | Error::Decode(_)) => {
        Core::Store(Box::new(e))
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
