//! JSON API layer for fixit.
//!
//! Exposes an axum [`Router`] backed by any [`fixit_core::store::RequestStore`].
//! The binary in `main.rs` wires in the SQLite store; tests drive the same
//! router against an in-memory one.

pub mod auth;
pub mod categories;
pub mod error;
pub mod requests;
pub mod resolutions;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use fixit_core::store::RequestStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `FIXIT_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RequestStore> {
  pub store: Arc<S>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RequestStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/api/health", get(health))
    // Accounts
    .route("/api/signup", post(users::sign_up::<S>))
    .route("/api/users", get(users::list::<S>).post(users::create::<S>))
    .route("/api/users/{id}", get(users::get_one::<S>))
    // Categories
    .route(
      "/api/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route("/api/categories/{id}", delete(categories::delete_one::<S>))
    // Requests
    .route(
      "/api/requests",
      get(requests::list::<S>).post(requests::create::<S>),
    )
    .route(
      "/api/requests/{id}",
      get(requests::get_one::<S>)
        .patch(requests::update::<S>)
        .delete(requests::delete_one::<S>),
    )
    .route("/api/requests/{id}/assignee", put(requests::assign::<S>))
    .route("/api/requests/{id}/status", put(requests::update_status::<S>))
    // Resolutions
    .route(
      "/api/requests/{id}/resolution",
      post(resolutions::create::<S>)
        .get(resolutions::get_for_request::<S>)
        .patch(resolutions::append_notes::<S>),
    )
    .route("/api/resolutions", get(resolutions::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use fixit_core::{
    store::RequestStore as _,
    user::{NewUser, Role, User},
  };
  use fixit_store_sqlite::SqliteStore;

  const PASSWORD: &str = "secret";

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState { store: Arc::new(store) }
  }

  async fn seed_user(
    state: &AppState<SqliteStore>,
    name: &str,
    role: Role,
  ) -> User {
    state
      .store
      .create_user(NewUser {
        username:      name.to_owned(),
        email:         format!("{name}@campus.test"),
        role,
        password_hash: auth::hash_password(PASSWORD).unwrap(),
      })
      .await
      .unwrap()
  }

  fn basic(email: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{PASSWORD}")))
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    auth_header: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth_header {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_public() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/api/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
  }

  // ── Signup ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn signup_creates_a_student_and_hides_the_hash() {
    let state = make_state().await;
    let resp = send(
      &state,
      "POST",
      "/api/signup",
      None,
      Some(serde_json::json!({
        "username": "alice",
        "email": "alice@campus.test",
        "password": "secret",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["role"], "STUDENT");
    assert!(body.get("password_hash").is_none(), "hash leaked: {body}");
  }

  #[tokio::test]
  async fn signup_as_admin_is_denied() {
    let state = make_state().await;
    let resp = send(
      &state,
      "POST",
      "/api/signup",
      None,
      Some(serde_json::json!({
        "username": "mallory",
        "email": "mallory@campus.test",
        "password": "secret",
        "role": "ADMIN",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["reason"], "role_forbidden");
  }

  #[tokio::test]
  async fn duplicate_signup_is_a_conflict() {
    let state = make_state().await;
    seed_user(&state, "alice", Role::Student).await;

    let resp = send(
      &state,
      "POST",
      "/api/signup",
      None,
      Some(serde_json::json!({
        "username": "alice-again",
        "email": "alice@campus.test",
        "password": "secret",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_create_gets_401_with_challenge() {
    let state = make_state().await;
    let resp = send(
      &state,
      "POST",
      "/api/requests",
      None,
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "HIGH",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_gets_401() {
    let state = make_state().await;
    seed_user(&state, "alice", Role::Student).await;

    let bad = format!(
      "Basic {}",
      B64.encode("alice@campus.test:wrong-password"),
    );
    let resp = send(&state, "GET", "/api/users/1", Some(&bad), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn reads_are_public_but_garbage_credentials_still_fail() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/api/requests", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      "GET",
      "/api/requests",
      Some("Basic !!!not-base64!!!"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Ownership forcing ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_ignores_a_caller_supplied_user_id() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let auth_header = basic(&alice.email);

    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&auth_header),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "HIGH",
        "user_id": 9999,
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["user_id"], alice.id);
  }

  // ── The full lifecycle ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn submission_to_resolution() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let admin = seed_user(&state, "root", Role::Admin).await;
    let tech7 = seed_user(&state, "tina", Role::Technician).await;
    let tech8 = seed_user(&state, "tom", Role::Technician).await;

    // Submitter files the request.
    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "HIGH",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["assigned_to"], Value::Null);
    let id = created["id"].as_i64().unwrap();

    // Admin assigns; status is untouched.
    let resp = send(
      &state,
      "PUT",
      &format!("/api/requests/{id}/assignee"),
      Some(&basic(&admin.email)),
      Some(serde_json::json!({ "technician_id": tech7.id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let assigned = body_json(resp).await;
    assert_eq!(assigned["assigned_to"], tech7.id);
    assert_eq!(assigned["status"], "PENDING");

    // The assigned technician starts work.
    let resp = send(
      &state,
      "PUT",
      &format!("/api/requests/{id}/status"),
      Some(&basic(&tech7.email)),
      Some(serde_json::json!({ "status": "IN_PROGRESS" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The unassigned technician gets nowhere.
    let resp = send(
      &state,
      "PUT",
      &format!("/api/requests/{id}/status"),
      Some(&basic(&tech8.email)),
      Some(serde_json::json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["reason"], "not_assignee");

    // The assigned technician records the resolution.
    let resp = send(
      &state,
      "POST",
      &format!("/api/requests/{id}/resolution"),
      Some(&basic(&tech7.email)),
      Some(serde_json::json!({ "admin_notes": "fixed" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&state, "GET", &format!("/api/requests/{id}"), None, None).await;
    assert_eq!(body_json(resp).await["status"], "RESOLVED");

    // A second resolution is a conflict.
    let resp = send(
      &state,
      "POST",
      &format!("/api/requests/{id}/resolution"),
      Some(&basic(&tech7.email)),
      Some(serde_json::json!({ "admin_notes": "fixed again" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn skipping_in_progress_is_a_bad_request() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let admin = seed_user(&state, "root", Role::Admin).await;

    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "LOW",
      })),
    )
    .await;
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = send(
      &state,
      "PUT",
      &format!("/api/requests/{id}/status"),
      Some(&basic(&admin.email)),
      Some(serde_json::json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Content mutation ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn non_owner_patch_is_forbidden() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let eve = seed_user(&state, "eve", Role::Student).await;

    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "LOW",
      })),
    )
    .await;
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = send(
      &state,
      "PATCH",
      &format!("/api/requests/{id}"),
      Some(&basic(&eve.email)),
      Some(serde_json::json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["reason"], "not_owner");

    let resp = send(
      &state,
      "PATCH",
      &format!("/api/requests/{id}"),
      Some(&basic(&alice.email)),
      Some(serde_json::json!({ "title": "Leak in Hall 3" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["title"], "Leak in Hall 3");
  }

  #[tokio::test]
  async fn delete_cascades_and_leaves_nothing_behind() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let admin = seed_user(&state, "root", Role::Admin).await;

    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "LOW",
      })),
    )
    .await;
    let id = body_json(resp).await["id"].as_i64().unwrap();

    // Resolve it (admin path) so a resolution row exists.
    for status in ["IN_PROGRESS", "RESOLVED"] {
      let resp = send(
        &state,
        "PUT",
        &format!("/api/requests/{id}/status"),
        Some(&basic(&admin.email)),
        Some(serde_json::json!({ "status": status })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(
      &state,
      "DELETE",
      &format!("/api/requests/{id}"),
      Some(&basic(&alice.email)),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["id"], id);

    let resp = send(&state, "GET", &format!("/api/requests/{id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
      &state,
      "GET",
      &format!("/api/resolutions?request_ids={id}"),
      Some(&basic(&admin.email)),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
  }

  // ── Listing ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn listing_paginates_and_reports_totals() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let auth_header = basic(&alice.email);

    for i in 0..5 {
      let resp = send(
        &state,
        "POST",
        "/api/requests",
        Some(&auth_header),
        Some(serde_json::json!({
          "title": format!("Request {i}"),
          "description": "details",
          "location": "Hall 3",
          "urgency": "LOW",
        })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = send(
      &state,
      "GET",
      "/api/requests?page=3&page_size=2",
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["page"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn unknown_filter_keys_are_rejected() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/api/requests?bogus=1", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn invalid_enum_filter_values_are_rejected() {
    let state = make_state().await;
    let resp =
      send(&state, "GET", "/api/requests?status=WHATEVER", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Assignment validation ───────────────────────────────────────────────────

  #[tokio::test]
  async fn assigning_a_student_is_an_invalid_reference() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let admin = seed_user(&state, "root", Role::Admin).await;

    let resp = send(
      &state,
      "POST",
      "/api/requests",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({
        "title": "Leak",
        "description": "ceiling drips",
        "location": "Hall 3",
        "urgency": "LOW",
      })),
    )
    .await;
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = send(
      &state,
      "PUT",
      &format!("/api/requests/{id}/assignee"),
      Some(&basic(&admin.email)),
      Some(serde_json::json!({ "technician_id": alice.id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Admin surfaces ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn user_and_category_management_is_admin_gated() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let admin = seed_user(&state, "root", Role::Admin).await;

    let resp =
      send(&state, "GET", "/api/users", Some(&basic(&alice.email)), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp =
      send(&state, "GET", "/api/users", Some(&basic(&admin.email)), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);

    let resp = send(
      &state,
      "POST",
      "/api/categories",
      Some(&basic(&alice.email)),
      Some(serde_json::json!({ "name": "Plumbing" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      &state,
      "POST",
      "/api/categories",
      Some(&basic(&admin.email)),
      Some(serde_json::json!({ "name": "Plumbing" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Anyone can browse categories.
    let resp = send(&state, "GET", "/api/categories", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn admin_creates_a_technician_account() {
    let state = make_state().await;
    let admin = seed_user(&state, "root", Role::Admin).await;

    let resp = send(
      &state,
      "POST",
      "/api/users",
      Some(&basic(&admin.email)),
      Some(serde_json::json!({
        "username": "tina",
        "email": "tina@campus.test",
        "password": "secret",
        "role": "TECHNICIAN",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["role"], "TECHNICIAN");
  }

  #[tokio::test]
  async fn users_read_themselves_but_not_each_other() {
    let state = make_state().await;
    let alice = seed_user(&state, "alice", Role::Student).await;
    let eve = seed_user(&state, "eve", Role::Student).await;

    let resp = send(
      &state,
      "GET",
      &format!("/api/users/{}", alice.id),
      Some(&basic(&alice.email)),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      "GET",
      &format!("/api/users/{}", alice.id),
      Some(&basic(&eve.email)),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }
}
