//! Categories — admin-managed labels that requests may reference.
//!
//! A category has its own lifecycle and is referenced by id, never embedded.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Category {
  pub id:   i64,
  pub name: String,
}
