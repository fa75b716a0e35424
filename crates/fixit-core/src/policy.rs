//! The access-control policy — one pure decision function.
//!
//! Every operation, regardless of transport, funnels through [`authorize`].
//! The function has no side effects and no I/O; for actions whose rules
//! depend on the target request (ownership, assignment) the caller passes
//! the current row. Race-sensitive callers re-run the same check inside
//! their store transaction.

use serde::Serialize;

use crate::{
  request::Request,
  user::{Principal, Role},
};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// Everything a caller can ask the core to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  CreateRequest,
  ReadRequest,
  ListRequests,
  UpdateRequestContent,
  DeleteRequest,
  AssignRequest,
  UpdateStatus,
  CreateResolution,
  AppendResolutionNotes,
  ManageCategory,
  ManageUsers,
}

// ─── Denial reasons ──────────────────────────────────────────────────────────

/// Why a request was denied. Carried on [`crate::Error::Forbidden`] so the
/// boundary can report a distinguishable reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deny {
  Unauthenticated,
  NotOwner,
  NotAssignee,
  RoleForbidden,
}

impl Deny {
  pub fn as_str(self) -> &'static str {
    match self {
      Deny::Unauthenticated => "unauthenticated",
      Deny::NotOwner => "not_owner",
      Deny::NotAssignee => "not_assignee",
      Deny::RoleForbidden => "role_forbidden",
    }
  }
}

impl std::fmt::Display for Deny {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── The decision function ───────────────────────────────────────────────────

/// Decide whether `principal` may perform `action`, optionally against
/// `target`.
///
/// Listing and reading requests are public in this system; every other
/// action requires an authenticated principal. Ownership and assignment
/// checks require `target`; passing `None` for those actions denies unless
/// the principal is an admin (admins never need the target row).
pub fn authorize(
  principal: Option<&Principal>,
  action: Action,
  target: Option<&Request>,
) -> Result<(), Deny> {
  // Public reads.
  if matches!(action, Action::ListRequests | Action::ReadRequest) {
    return Ok(());
  }

  let p = principal.ok_or(Deny::Unauthenticated)?;

  match action {
    Action::CreateRequest => Ok(()),

    Action::UpdateRequestContent | Action::DeleteRequest => {
      if p.is_admin() {
        return Ok(());
      }
      match target {
        Some(req) if req.user_id == p.id => Ok(()),
        _ => Err(Deny::NotOwner),
      }
    }

    Action::UpdateStatus => match p.role {
      Role::Admin => Ok(()),
      Role::Technician => match target {
        Some(req) if req.assigned_to == Some(p.id) => Ok(()),
        _ => Err(Deny::NotAssignee),
      },
      Role::Student => Err(Deny::RoleForbidden),
    },

    Action::CreateResolution => match p.role {
      Role::Technician => match target {
        Some(req) if req.assigned_to == Some(p.id) => Ok(()),
        _ => Err(Deny::NotAssignee),
      },
      _ => Err(Deny::RoleForbidden),
    },

    Action::AssignRequest
    | Action::AppendResolutionNotes
    | Action::ManageCategory
    | Action::ManageUsers => {
      if p.is_admin() {
        Ok(())
      } else {
        Err(Deny::RoleForbidden)
      }
    }

    // Public reads; handled before the principal check.
    Action::ListRequests | Action::ReadRequest => Ok(()),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
