//! The operation surface — what transports actually call.
//!
//! Free async functions generic over the store. Every operation takes the
//! caller's [`Principal`] explicitly (or `Option<&Principal>` for the public
//! reads) and begins by consulting [`policy::authorize`]; no transport-level
//! handler performs its own role checks.
//!
//! Input validation lives here too: enum fields were already parsed at the
//! boundary, so what remains is non-emptiness and cross-field rules.

use crate::{
  Error, Result,
  category::Category,
  policy::{self, Action, Deny},
  query::{Page, RequestQuery},
  request::{NewRequest, Request, RequestDraft, RequestPatch, Status},
  resolution::{NewResolution, Resolution},
  store::RequestStore,
  user::{NewUser, Principal, Role, Signup, User},
};

fn non_empty(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    Err(Error::Validation(format!("{field} must not be empty")))
  } else {
    Ok(())
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Create a request owned by the caller.
///
/// Ownership is forced here: the draft carries no submitter id, and any id a
/// transport payload may have carried was discarded before this point.
pub async fn create_request<S: RequestStore>(
  store: &S,
  principal: &Principal,
  draft: RequestDraft,
) -> Result<Request> {
  policy::authorize(Some(principal), Action::CreateRequest, None)?;

  non_empty("title", &draft.title)?;
  non_empty("description", &draft.description)?;
  non_empty("location", &draft.location)?;

  let input = NewRequest {
    title:       draft.title,
    description: draft.description,
    location:    draft.location,
    urgency:     draft.urgency,
    user_id:     principal.id,
    category_id: draft.category_id,
    photo_url:   draft.photo_url,
  };

  store.create_request(input).await.map_err(Into::into)
}

pub async fn list_requests<S: RequestStore>(
  store: &S,
  principal: Option<&Principal>,
  query: RequestQuery,
) -> Result<Page<Request>> {
  policy::authorize(principal, Action::ListRequests, None)?;
  store.list_requests(query).await.map_err(Into::into)
}

pub async fn get_request<S: RequestStore>(
  store: &S,
  principal: Option<&Principal>,
  id: i64,
) -> Result<Request> {
  policy::authorize(principal, Action::ReadRequest, None)?;
  store
    .get_request(id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::RequestNotFound(id))
}

pub async fn update_request_content<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
  patch: RequestPatch,
) -> Result<Request> {
  // Ownership is immutable, so checking against a pre-transaction read is
  // sound.
  let target = store
    .get_request(id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::RequestNotFound(id))?;
  policy::authorize(Some(principal), Action::UpdateRequestContent, Some(&target))?;

  if patch.is_empty() {
    return Err(Error::Validation("no fields to update".into()));
  }
  if let Some(title) = &patch.title {
    non_empty("title", title)?;
  }
  if let Some(description) = &patch.description {
    non_empty("description", description)?;
  }
  if let Some(location) = &patch.location {
    non_empty("location", location)?;
  }

  store.update_request_content(id, patch).await.map_err(Into::into)
}

/// Delete a request, cascading its resolution. Returns the deleted id.
pub async fn delete_request<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
) -> Result<i64> {
  let target = store
    .get_request(id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::RequestNotFound(id))?;
  policy::authorize(Some(principal), Action::DeleteRequest, Some(&target))?;

  store.delete_request(id).await.map_err(Into::into)?;
  Ok(id)
}

/// Assign a technician. Independent of status: assigning never moves the
/// request out of `PENDING` by itself.
pub async fn assign_request<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
  technician_id: i64,
) -> Result<Request> {
  policy::authorize(Some(principal), Action::AssignRequest, None)?;
  store.assign_request(id, technician_id).await.map_err(Into::into)
}

/// Move a request through the lifecycle.
///
/// The early authorize gives precise denials against the current row; the
/// store re-runs both policy and transition validation inside its
/// transaction, so a concurrent assignment or status change cannot be
/// overtaken.
pub async fn update_status<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
  new_status: Status,
) -> Result<Request> {
  let target = store
    .get_request(id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::RequestNotFound(id))?;
  policy::authorize(Some(principal), Action::UpdateStatus, Some(&target))?;

  store.update_status(*principal, id, new_status).await.map_err(Into::into)
}

// ─── Resolutions ─────────────────────────────────────────────────────────────

/// Record the resolution for an in-progress request and move it to
/// `RESOLVED`, atomically.
pub async fn create_resolution<S: RequestStore>(
  store: &S,
  principal: &Principal,
  request_id: i64,
  input: NewResolution,
) -> Result<Resolution> {
  let target = store
    .get_request(request_id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::RequestNotFound(request_id))?;
  policy::authorize(Some(principal), Action::CreateResolution, Some(&target))?;

  store
    .create_resolution(*principal, request_id, input)
    .await
    .map_err(Into::into)
}

pub async fn append_resolution_notes<S: RequestStore>(
  store: &S,
  principal: &Principal,
  request_id: i64,
  notes: String,
) -> Result<Resolution> {
  policy::authorize(Some(principal), Action::AppendResolutionNotes, None)?;
  non_empty("notes", &notes)?;
  store
    .append_resolution_notes(request_id, notes)
    .await
    .map_err(Into::into)
}

pub async fn get_resolution<S: RequestStore>(
  store: &S,
  principal: Option<&Principal>,
  request_id: i64,
) -> Result<Resolution> {
  policy::authorize(principal, Action::ReadRequest, None)?;
  store
    .list_resolutions(vec![request_id])
    .await
    .map_err(Into::into)?
    .into_iter()
    .next()
    .ok_or(Error::ResolutionNotFound(request_id))
}

pub async fn list_resolutions<S: RequestStore>(
  store: &S,
  principal: Option<&Principal>,
  request_ids: Vec<i64>,
) -> Result<Vec<Resolution>> {
  policy::authorize(principal, Action::ReadRequest, None)?;
  store.list_resolutions(request_ids).await.map_err(Into::into)
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Open signup. Always creates a STUDENT account; a payload asking for any
/// other role is denied unconditionally, before any store access.
pub async fn sign_up<S: RequestStore>(
  store: &S,
  signup: Signup,
) -> Result<User> {
  if matches!(signup.requested_role, Some(Role::Admin | Role::Technician)) {
    return Err(Error::Forbidden(Deny::RoleForbidden));
  }

  non_empty("username", &signup.username)?;
  non_empty("email", &signup.email)?;

  let input = NewUser {
    username:      signup.username,
    email:         signup.email,
    role:          Role::Student,
    password_hash: signup.password_hash,
  };
  store.create_user(input).await.map_err(Into::into)
}

/// Admin-gated account creation; the only path that can mint TECHNICIAN and
/// ADMIN accounts.
pub async fn create_user<S: RequestStore>(
  store: &S,
  principal: &Principal,
  input: NewUser,
) -> Result<User> {
  policy::authorize(Some(principal), Action::ManageUsers, None)?;
  non_empty("username", &input.username)?;
  non_empty("email", &input.email)?;
  store.create_user(input).await.map_err(Into::into)
}

pub async fn list_users<S: RequestStore>(
  store: &S,
  principal: &Principal,
) -> Result<Vec<User>> {
  policy::authorize(Some(principal), Action::ManageUsers, None)?;
  store.list_users().await.map_err(Into::into)
}

/// Fetch one account: admins may read anyone, everyone may read themselves.
pub async fn get_user<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
) -> Result<User> {
  if principal.id != id {
    policy::authorize(Some(principal), Action::ManageUsers, None)?;
  }
  store
    .get_user(id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::UserNotFound(id))
}

// ─── Categories ──────────────────────────────────────────────────────────────

pub async fn create_category<S: RequestStore>(
  store: &S,
  principal: &Principal,
  name: String,
) -> Result<Category> {
  policy::authorize(Some(principal), Action::ManageCategory, None)?;
  non_empty("name", &name)?;
  store.create_category(name).await.map_err(Into::into)
}

/// Public read — submitters pick a category while filing a request.
pub async fn list_categories<S: RequestStore>(
  store: &S,
) -> Result<Vec<Category>> {
  store.list_categories().await.map_err(Into::into)
}

pub async fn delete_category<S: RequestStore>(
  store: &S,
  principal: &Principal,
  id: i64,
) -> Result<()> {
  policy::authorize(Some(principal), Action::ManageCategory, None)?;
  store.delete_category(id).await.map_err(Into::into)
}
