//! Error taxonomy for `fixit-core`.
//!
//! Every rejected operation maps to exactly one variant here, and leaves all
//! entities unchanged. Only [`Error::Store`] is unrecoverable from the
//! caller's point of view; everything else can be retried after correcting
//! the input or acquiring the right role.

use thiserror::Error;

use crate::{policy::Deny, request::Status};

#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(Deny),

  #[error("request not found: {0}")]
  RequestNotFound(i64),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("category not found: {0}")]
  CategoryNotFound(i64),

  #[error("no resolution recorded for request {0}")]
  ResolutionNotFound(i64),

  #[error("{0}")]
  Validation(String),

  #[error("invalid transition: {from} -> {to}")]
  InvalidTransition { from: Status, to: Status },

  #[error("request {0} already has a resolution")]
  DuplicateResolution(i64),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("invalid reference: {0}")]
  InvalidReference(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<Deny> for Error {
  fn from(deny: Deny) -> Self {
    match deny {
      Deny::Unauthenticated => Error::Unauthenticated,
      other => Error::Forbidden(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
