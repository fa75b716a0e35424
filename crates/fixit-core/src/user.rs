//! Users and the per-call [`Principal`].
//!
//! The core never looks at passwords; `password_hash` is an opaque PHC
//! string owned by whatever identity layer fronts the store. A `Principal`
//! is handed to every operation explicitly — there is no ambient "current
//! user" anywhere in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The closed set of account roles. Parsed once at the boundary; the core
/// never compares role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Student,
  Technician,
  Admin,
}

impl Role {
  /// The text form stored in the `role` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Student => "STUDENT",
      Role::Technician => "TECHNICIAN",
      Role::Admin => "ADMIN",
    }
  }

  pub fn parse(s: &str) -> Option<Role> {
    match s {
      "STUDENT" => Some(Role::Student),
      "TECHNICIAN" => Some(Role::Technician),
      "ADMIN" => Some(Role::Admin),
      _ => None,
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Principal ───────────────────────────────────────────────────────────────

/// An authenticated caller, resolved per call by the identity layer.
/// Never persisted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
  pub id:   i64,
  pub role: Role,
}

impl Principal {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A stored account. `password_hash` never leaves the server: it is skipped
/// on serialisation.
#[derive(Debug, Clone, Serialize)]
pub struct User {
  pub id:            i64,
  pub username:      String,
  /// Unique; doubles as the login identifier.
  pub email:         String,
  pub role:          Role,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn principal(&self) -> Principal {
    Principal { id: self.id, role: self.role }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RequestStore::create_user`]. The role has already
/// been decided by the calling operation; open signup never reaches the store
/// with anything but [`Role::Student`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub role:          Role,
  pub password_hash: String,
}

/// Input to [`crate::ops::sign_up`] — the open registration path.
///
/// `requested_role` is what the payload asked for, if anything; asking for
/// anything other than STUDENT is denied unconditionally.
#[derive(Debug, Clone)]
pub struct Signup {
  pub username:       String,
  pub email:          String,
  pub password_hash:  String,
  pub requested_role: Option<Role>,
}
