//! The `RequestStore` trait — the contract every storage backend implements.
//!
//! Higher layers depend on this abstraction, not on any concrete backend.
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).
//!
//! Status transitions, resolution creation, and request deletion are
//! specified as single atomic units (read current state → validate → write);
//! `update_status` and `create_resolution` therefore take the acting
//! [`Principal`] so the backend can re-run [`crate::policy::authorize`] and
//! [`crate::lifecycle::validate_transition`] against the row it actually
//! reads inside its transaction.

use std::future::Future;

use crate::{
  category::Category,
  query::{Page, RequestQuery},
  request::{NewRequest, Request, RequestPatch, Status},
  resolution::{NewResolution, Resolution},
  user::{NewUser, Principal, User},
};

pub trait RequestStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new account. Fails if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up the account behind a login identifier.
  fn find_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  fn create_category(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Delete a category; requests referencing it keep existing with their
  /// `category_id` cleared.
  fn delete_category(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Persist a new request: status `PENDING`, unassigned, `created_at` set
  /// by the store. A supplied `category_id` must reference an existing
  /// category.
  fn create_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<Request, Self::Error>> + Send + '_;

  fn get_request(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Request>, Self::Error>> + Send + '_;

  /// Run the list query: filter, sort (with the `id ASC` tie-break), and
  /// paginate, returning the page plus the pre-pagination total.
  fn list_requests(
    &self,
    query: RequestQuery,
  ) -> impl Future<Output = Result<Page<Request>, Self::Error>> + Send + '_;

  /// Apply a partial content update. Never touches status, ownership, or
  /// assignment.
  fn update_request_content(
    &self,
    id: i64,
    patch: RequestPatch,
  ) -> impl Future<Output = Result<Request, Self::Error>> + Send + '_;

  /// Delete a request and, in the same atomic unit, its resolution.
  fn delete_request(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Set `assigned_to`. The assignee must exist and hold the TECHNICIAN
  /// role. Does not change status.
  fn assign_request(
    &self,
    id: i64,
    technician_id: i64,
  ) -> impl Future<Output = Result<Request, Self::Error>> + Send + '_;

  /// Atomically validate and apply a status transition. A move into
  /// `RESOLVED` creates the (empty) resolution record in the same
  /// transaction.
  fn update_status(
    &self,
    actor: Principal,
    id: i64,
    new_status: Status,
  ) -> impl Future<Output = Result<Request, Self::Error>> + Send + '_;

  // ── Resolutions ───────────────────────────────────────────────────────

  /// Atomically create the resolution and move the request to `RESOLVED`.
  /// Both writes succeed or neither does.
  fn create_resolution(
    &self,
    actor: Principal,
    request_id: i64,
    input: NewResolution,
  ) -> impl Future<Output = Result<Resolution, Self::Error>> + Send + '_;

  /// Append to the admin notes of an existing resolution.
  fn append_resolution_notes(
    &self,
    request_id: i64,
    notes: String,
  ) -> impl Future<Output = Result<Resolution, Self::Error>> + Send + '_;

  /// Fetch the resolutions for the given request ids. Ids without a
  /// resolution simply contribute nothing.
  fn list_resolutions(
    &self,
    request_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<Resolution>, Self::Error>> + Send + '_;
}
