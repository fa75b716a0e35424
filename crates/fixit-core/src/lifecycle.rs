//! The request lifecycle state machine.
//!
//! ```text
//! PENDING ──> IN_PROGRESS ──> RESOLVED
//!    │             │
//!    └──────┬──────┘
//!           v
//!       CANCELLED
//! ```
//!
//! `RESOLVED` and `CANCELLED` are terminal. Setting a status to the value it
//! already holds is accepted as a no-op — callers retry safely. Validation
//! is pure; the store runs it inside the write transaction so a concurrent
//! transition is observed before this one commits.

use thiserror::Error;

use crate::{
  request::Status,
  user::{Principal, Role},
};

/// The outcome of a validated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// Status set to the value it already holds; accepted, nothing to write.
  NoOp,
  /// A real state change. A move into [`Status::Resolved`] must create a
  /// resolution record in the same atomic unit.
  Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("invalid transition: {from} -> {to}")]
  Invalid { from: Status, to: Status },

  #[error("request must be assigned before work can start")]
  Unassigned,

  #[error("only an admin may cancel a request")]
  AdminOnly,
}

impl From<TransitionError> for crate::Error {
  fn from(e: TransitionError) -> Self {
    match e {
      TransitionError::Invalid { from, to } => {
        crate::Error::InvalidTransition { from, to }
      }
      TransitionError::Unassigned => {
        crate::Error::Validation(e.to_string())
      }
      TransitionError::AdminOnly => {
        crate::Error::Forbidden(crate::policy::Deny::RoleForbidden)
      }
    }
  }
}

/// Validate moving a request from `current` to `new`.
///
/// `assigned_to` is the request's assignee at the moment of validation —
/// starting work requires one unless the actor is an admin.
pub fn validate_transition(
  current: Status,
  new: Status,
  actor: &Principal,
  assigned_to: Option<i64>,
) -> Result<Transition, TransitionError> {
  if current == new {
    return Ok(Transition::NoOp);
  }

  match (current, new) {
    (Status::Pending, Status::InProgress) => {
      if assigned_to.is_some() || actor.role == Role::Admin {
        Ok(Transition::Move)
      } else {
        Err(TransitionError::Unassigned)
      }
    }

    (Status::InProgress, Status::Resolved) => Ok(Transition::Move),

    (Status::Pending | Status::InProgress, Status::Cancelled) => {
      if actor.role == Role::Admin {
        Ok(Transition::Move)
      } else {
        Err(TransitionError::AdminOnly)
      }
    }

    (from, to) => Err(TransitionError::Invalid { from, to }),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
