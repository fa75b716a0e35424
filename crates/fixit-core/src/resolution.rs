//! Resolutions — the immutable evidence that a request reached `RESOLVED`.
//!
//! At most one resolution exists per request (UNIQUE on `request_id`), and
//! one is created in the same atomic unit as the transition into `RESOLVED`.
//! After creation the only permitted change is an admin appending notes.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
  pub id:                   i64,
  pub request_id:           i64,
  pub admin_notes:          Option<String>,
  /// Opaque reference to a photo the technician took of the finished work.
  pub technician_photo_url: Option<String>,
  pub resolved_at:          DateTime<Utc>,
}

/// Input to [`crate::store::RequestStore::create_resolution`].
/// `resolved_at` is always set by the store.
#[derive(Debug, Clone, Default)]
pub struct NewResolution {
  pub admin_notes:          Option<String>,
  pub technician_photo_url: Option<String>,
}
