//! Decoding helpers between SQLite rows and domain types.
//!
//! All timestamps are stored as RFC 3339 strings; enum columns store the
//! canonical text forms from the core (`Status::as_str` and friends), so the
//! decoders here only add the error plumbing.

use chrono::{DateTime, Utc};
use fixit_core::{
  request::{Request, Status, Urgency},
  resolution::Resolution,
  user::{Role, User},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_status(s: &str) -> Result<Status> {
  Status::parse(s).ok_or_else(|| Error::Decode(format!("unknown status: {s:?}")))
}

fn decode_urgency(s: &str) -> Result<Urgency> {
  Urgency::parse(s).ok_or_else(|| Error::Decode(format!("unknown urgency: {s:?}")))
}

fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::Decode(format!("unknown role: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `requests` row.
#[derive(Clone)]
pub struct RawRequest {
  pub id:          i64,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub urgency:     String,
  pub status:      String,
  pub user_id:     i64,
  pub assigned_to: Option<i64>,
  pub category_id: Option<i64>,
  pub photo_url:   Option<String>,
  pub created_at:  String,
}

impl RawRequest {
  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      id:          self.id,
      title:       self.title,
      description: self.description,
      location:    self.location,
      urgency:     decode_urgency(&self.urgency)?,
      status:      decode_status(&self.status)?,
      user_id:     self.user_id,
      assigned_to: self.assigned_to,
      category_id: self.category_id,
      photo_url:   self.photo_url,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:            i64,
  pub username:      String,
  pub email:         String,
  pub role:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            self.id,
      username:      self.username,
      email:         self.email,
      role:          decode_role(&self.role)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `resolutions` row.
pub struct RawResolution {
  pub id:                   i64,
  pub request_id:           i64,
  pub admin_notes:          Option<String>,
  pub technician_photo_url: Option<String>,
  pub resolved_at:          String,
}

impl RawResolution {
  pub fn into_resolution(self) -> Result<Resolution> {
    Ok(Resolution {
      id:                   self.id,
      request_id:           self.request_id,
      admin_notes:          self.admin_notes,
      technician_photo_url: self.technician_photo_url,
      resolved_at:          decode_dt(&self.resolved_at)?,
    })
  }
}
