//! The maintenance [`Request`] entity and its closed vocabularies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Urgency ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
  Low,
  Medium,
  High,
}

impl Urgency {
  pub fn as_str(self) -> &'static str {
    match self {
      Urgency::Low => "LOW",
      Urgency::Medium => "MEDIUM",
      Urgency::High => "HIGH",
    }
  }

  pub fn parse(s: &str) -> Option<Urgency> {
    match s {
      "LOW" => Some(Urgency::Low),
      "MEDIUM" => Some(Urgency::Medium),
      "HIGH" => Some(Urgency::High),
      _ => None,
    }
  }
}

impl std::fmt::Display for Urgency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Request lifecycle status. Transitions between values are validated by
/// [`crate::lifecycle::validate_transition`]; nothing else may change a
/// request's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Pending,
  InProgress,
  Resolved,
  Cancelled,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Status::Pending => "PENDING",
      Status::InProgress => "IN_PROGRESS",
      Status::Resolved => "RESOLVED",
      Status::Cancelled => "CANCELLED",
    }
  }

  pub fn parse(s: &str) -> Option<Status> {
    match s {
      "PENDING" => Some(Status::Pending),
      "IN_PROGRESS" => Some(Status::InProgress),
      "RESOLVED" => Some(Status::Resolved),
      "CANCELLED" => Some(Status::Cancelled),
      _ => None,
    }
  }

  /// Terminal states have no outgoing transitions.
  pub fn is_terminal(self) -> bool {
    matches!(self, Status::Resolved | Status::Cancelled)
  }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// One maintenance issue.
///
/// `user_id` and `created_at` are set at creation and never change;
/// ownership never transfers. A request is created `PENDING` and unassigned.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
  pub id:          i64,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub urgency:     Urgency,
  pub status:      Status,
  /// The submitting user; immutable.
  pub user_id:     i64,
  /// The technician working the request, once an admin assigns one.
  pub assigned_to: Option<i64>,
  pub category_id: Option<i64>,
  /// Opaque reference to an externally stored image; never fetched or
  /// validated by the core.
  pub photo_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Caller-supplied content for a new request. Deliberately has no `user_id`
/// field: ownership is forced to the authenticated principal by
/// [`crate::ops::create_request`].
#[derive(Debug, Clone)]
pub struct RequestDraft {
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub urgency:     Urgency,
  pub category_id: Option<i64>,
  pub photo_url:   Option<String>,
}

/// Input to [`crate::store::RequestStore::create_request`], with ownership
/// already decided. `status`/`assigned_to`/`created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub urgency:     Urgency,
  pub user_id:     i64,
  pub category_id: Option<i64>,
  pub photo_url:   Option<String>,
}

/// Partial content update. `None` fields are left untouched. Status is
/// deliberately absent — status only moves through
/// [`crate::ops::update_status`].
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub urgency:     Option<Urgency>,
  pub photo_url:   Option<String>,
}

impl RequestPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.location.is_none()
      && self.urgency.is_none()
      && self.photo_url.is_none()
  }
}
