//! [`SqliteStore`] — the SQLite implementation of [`RequestStore`].
//!
//! Domain failures discovered inside a `conn.call` closure travel out as
//! `Ok(Err(..))` so that `?` keeps converting rusqlite errors; the outer
//! method flattens with `.await??`.

use std::path::Path;

use chrono::Utc;
use rusqlite::{
  OptionalExtension as _, params, params_from_iter, types::Value,
};

use fixit_core::{
  category::Category,
  lifecycle::{self, Transition},
  policy::{self, Action},
  query::{Page, RequestQuery, Sort, SortDirection, SortField},
  request::{NewRequest, Request, RequestPatch, Status},
  resolution::{NewResolution, Resolution},
  store::RequestStore,
  user::{NewUser, Principal, Role, User},
};

use crate::{
  Error, Result,
  encode::{RawRequest, RawResolution, RawUser, encode_dt},
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

const REQUEST_COLUMNS: &str = "id, title, description, location, urgency, \
                               status, user_id, assigned_to, category_id, \
                               photo_url, created_at";

fn request_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    id:          row.get(0)?,
    title:       row.get(1)?,
    description: row.get(2)?,
    location:    row.get(3)?,
    urgency:     row.get(4)?,
    status:      row.get(5)?,
    user_id:     row.get(6)?,
    assigned_to: row.get(7)?,
    category_id: row.get(8)?,
    photo_url:   row.get(9)?,
    created_at:  row.get(10)?,
  })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    id:            row.get(0)?,
    username:      row.get(1)?,
    email:         row.get(2)?,
    role:          row.get(3)?,
    password_hash: row.get(4)?,
    created_at:    row.get(5)?,
  })
}

fn resolution_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawResolution> {
  Ok(RawResolution {
    id:                   row.get(0)?,
    request_id:           row.get(1)?,
    admin_notes:          row.get(2)?,
    technician_photo_url: row.get(3)?,
    resolved_at:          row.get(4)?,
  })
}

/// Fetch one request row; usable inside a transaction (`Transaction` derefs
/// to `Connection`).
fn get_request_row(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawRequest>> {
  conn
    .query_row(
      &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = ?1"),
      params![id],
      request_from_row,
    )
    .optional()
}

fn get_resolution_row(
  conn: &rusqlite::Connection,
  request_id: i64,
) -> rusqlite::Result<Option<RawResolution>> {
  conn
    .query_row(
      "SELECT id, request_id, admin_notes, technician_photo_url, resolved_at
       FROM resolutions WHERE request_id = ?1",
      params![request_id],
      resolution_from_row,
    )
    .optional()
}

/// Translate a validated sort into SQL. Urgency and status order by their
/// semantic rank rather than their text encodings; `id ASC` is always the
/// tie-break so equal keys keep a stable order.
fn order_clause(sort: Sort) -> String {
  let key = match sort.field {
    SortField::Id => "id",
    SortField::CreatedAt => "created_at",
    SortField::Urgency => {
      "CASE urgency WHEN 'LOW' THEN 0 WHEN 'MEDIUM' THEN 1 ELSE 2 END"
    }
    SortField::Status => {
      "CASE status WHEN 'PENDING' THEN 0 WHEN 'IN_PROGRESS' THEN 1 \
       WHEN 'RESOLVED' THEN 2 ELSE 3 END"
    }
    SortField::CategoryId => "category_id",
    SortField::AssignedTo => "assigned_to",
  };
  let dir = match sort.direction {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  };
  format!("ORDER BY {key} {dir}, id ASC")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fixit store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let NewUser { username, email, role, password_hash } = input;
    let created_at = Utc::now();

    let at_str     = encode_dt(created_at);
    let username_c = username.clone();
    let email_c    = email.clone();
    let hash_c     = password_hash.clone();
    let role_str   = role.as_str();

    let id = self
      .conn
      .call(move |conn| {
        // Email uniqueness is checked and the row inserted in one closure,
        // which runs alone on the connection thread.
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            params![email_c],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Err(Error::EmailTaken(email_c)));
        }

        conn.execute(
          "INSERT INTO users (username, email, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![username_c, email_c, role_str, hash_c, at_str],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    Ok(User { id, username, email, role, password_hash, created_at })
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, email, role, password_hash, created_at
               FROM users WHERE id = ?1",
              params![id],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, email, role, password_hash, created_at
               FROM users WHERE email = ?1",
              params![email],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, username, email, role, password_hash, created_at
           FROM users ORDER BY id ASC",
        )?;
        let rows = stmt
          .query_map([], user_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, name: String) -> Result<Category> {
    let name_c = name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (name) VALUES (?1)",
          params![name_c],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Category { id, name })
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let categories = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, name FROM categories ORDER BY id ASC")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Category { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(categories)
  }

  async fn delete_category(&self, id: i64) -> Result<()> {
    // Referencing requests keep existing: the schema declares
    // ON DELETE SET NULL on requests.category_id.
    self
      .conn
      .call(move |conn| {
        let n = conn
          .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if n == 0 {
          return Ok(Err(Error::CategoryNotFound(id)));
        }
        Ok(Ok(()))
      })
      .await??;

    Ok(())
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn create_request(&self, input: NewRequest) -> Result<Request> {
    let NewRequest {
      title,
      description,
      location,
      urgency,
      user_id,
      category_id,
      photo_url,
    } = input;
    let created_at = Utc::now();

    let at_str        = encode_dt(created_at);
    let title_c       = title.clone();
    let description_c = description.clone();
    let location_c    = location.clone();
    let photo_c       = photo_url.clone();
    let urgency_str   = urgency.as_str();

    let id = self
      .conn
      .call(move |conn| {
        if let Some(cat) = category_id {
          let exists: bool = conn
            .query_row(
              "SELECT 1 FROM categories WHERE id = ?1",
              params![cat],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(Err(Error::InvalidCategory(cat)));
          }
        }

        conn.execute(
          "INSERT INTO requests (
             title, description, location, urgency, status,
             user_id, assigned_to, category_id, photo_url, created_at
           ) VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, NULL, ?6, ?7, ?8)",
          params![
            title_c,
            description_c,
            location_c,
            urgency_str,
            user_id,
            category_id,
            photo_c,
            at_str,
          ],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    Ok(Request {
      id,
      title,
      description,
      location,
      urgency,
      status: Status::Pending,
      user_id,
      assigned_to: None,
      category_id,
      photo_url,
      created_at,
    })
  }

  async fn get_request(&self, id: i64) -> Result<Option<Request>> {
    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| Ok(get_request_row(conn, id)?))
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn list_requests(&self, query: RequestQuery) -> Result<Page<Request>> {
    let RequestQuery { filter, sort, page } = query;

    // Build the WHERE clause dynamically; placeholders bind in order.
    let mut conds: Vec<&'static str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
      conds.push("status = ?");
      args.push(Value::from(status.as_str().to_owned()));
    }
    if let Some(urgency) = filter.urgency {
      conds.push("urgency = ?");
      args.push(Value::from(urgency.as_str().to_owned()));
    }
    if let Some(category_id) = filter.category_id {
      conds.push("category_id = ?");
      args.push(Value::from(category_id));
    }
    if let Some(user_id) = filter.user_id {
      conds.push("user_id = ?");
      args.push(Value::from(user_id));
    }
    if let Some(assigned_to) = filter.assigned_to {
      conds.push("assigned_to = ?");
      args.push(Value::from(assigned_to));
    }
    if let Some(q) = &filter.q {
      conds.push("(LOWER(title) LIKE ? OR LOWER(description) LIKE ?)");
      let pattern = format!("%{}%", q.to_lowercase());
      args.push(Value::from(pattern.clone()));
      args.push(Value::from(pattern));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM requests {where_clause}");
    let page_sql = format!(
      "SELECT {REQUEST_COLUMNS} FROM requests {where_clause} {} LIMIT ? OFFSET ?",
      order_clause(sort),
    );

    let limit  = page.limit() as i64;
    let offset = page.offset() as i64;

    // COUNT and page SELECT run in one closure so the total matches the rows.
    let (total, raws) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          params_from_iter(args.iter()),
          |row| row.get(0),
        )?;

        let mut page_args = args;
        page_args.push(Value::from(limit));
        page_args.push(Value::from(offset));

        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
          .query_map(params_from_iter(page_args.iter()), request_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawRequest::into_request)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(items, total as u64, page))
  }

  async fn update_request_content(
    &self,
    id: i64,
    patch: RequestPatch,
  ) -> Result<Request> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let mut sets: Vec<&'static str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(title) = patch.title {
          sets.push("title = ?");
          args.push(Value::from(title));
        }
        if let Some(description) = patch.description {
          sets.push("description = ?");
          args.push(Value::from(description));
        }
        if let Some(location) = patch.location {
          sets.push("location = ?");
          args.push(Value::from(location));
        }
        if let Some(urgency) = patch.urgency {
          sets.push("urgency = ?");
          args.push(Value::from(urgency.as_str().to_owned()));
        }
        if let Some(photo_url) = patch.photo_url {
          sets.push("photo_url = ?");
          args.push(Value::from(photo_url));
        }

        if !sets.is_empty() {
          let sql =
            format!("UPDATE requests SET {} WHERE id = ?", sets.join(", "));
          args.push(Value::from(id));
          let n = tx.execute(&sql, params_from_iter(args.iter()))?;
          if n == 0 {
            return Ok(Err(Error::RequestNotFound(id)));
          }
        }

        let Some(raw) = get_request_row(&tx, id)? else {
          return Ok(Err(Error::RequestNotFound(id)));
        };
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_request()
  }

  async fn delete_request(&self, id: i64) -> Result<()> {
    // Children first, then the row, in one transaction.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM resolutions WHERE request_id = ?1",
          params![id],
        )?;
        let n = tx.execute("DELETE FROM requests WHERE id = ?1", params![id])?;
        if n == 0 {
          return Ok(Err(Error::RequestNotFound(id)));
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(())
  }

  async fn assign_request(
    &self,
    id: i64,
    technician_id: i64,
  ) -> Result<Request> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if get_request_row(&tx, id)?.is_none() {
          return Ok(Err(Error::RequestNotFound(id)));
        }

        let role: Option<String> = tx
          .query_row(
            "SELECT role FROM users WHERE id = ?1",
            params![technician_id],
            |row| row.get(0),
          )
          .optional()?;
        if role.as_deref().and_then(Role::parse) != Some(Role::Technician) {
          return Ok(Err(Error::InvalidAssignee(technician_id)));
        }

        // Assignment never changes status.
        tx.execute(
          "UPDATE requests SET assigned_to = ?1 WHERE id = ?2",
          params![technician_id, id],
        )?;

        let Some(raw) = get_request_row(&tx, id)? else {
          return Ok(Err(Error::RequestNotFound(id)));
        };
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_request()
  }

  async fn update_status(
    &self,
    actor: Principal,
    id: i64,
    new_status: Status,
  ) -> Result<Request> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(raw) = get_request_row(&tx, id)? else {
          return Ok(Err(Error::RequestNotFound(id)));
        };
        let current = match raw.clone().into_request() {
          Ok(r) => r,
          Err(e) => return Ok(Err(e)),
        };

        // Re-run policy and transition validation against the row this
        // transaction actually sees; the pre-transaction check in the ops
        // layer may be stale.
        if let Err(deny) =
          policy::authorize(Some(&actor), Action::UpdateStatus, Some(&current))
        {
          return Ok(Err(Error::Forbidden(deny)));
        }

        match lifecycle::validate_transition(
          current.status,
          new_status,
          &actor,
          current.assigned_to,
        ) {
          Ok(Transition::NoOp) => {
            tx.commit()?;
            return Ok(Ok(raw));
          }
          Ok(Transition::Move) => {}
          Err(e) => return Ok(Err(Error::Transition(e))),
        }

        if new_status == Status::Resolved {
          if get_resolution_row(&tx, id)?.is_some() {
            return Ok(Err(Error::DuplicateResolution(id)));
          }
          // The transition and its evidence commit together.
          tx.execute(
            "INSERT INTO resolutions
               (request_id, admin_notes, technician_photo_url, resolved_at)
             VALUES (?1, NULL, NULL, ?2)",
            params![id, encode_dt(Utc::now())],
          )?;
        }

        tx.execute(
          "UPDATE requests SET status = ?1 WHERE id = ?2",
          params![new_status.as_str(), id],
        )?;

        let Some(raw) = get_request_row(&tx, id)? else {
          return Ok(Err(Error::RequestNotFound(id)));
        };
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_request()
  }

  // ── Resolutions ───────────────────────────────────────────────────────────

  async fn create_resolution(
    &self,
    actor: Principal,
    request_id: i64,
    input: NewResolution,
  ) -> Result<Resolution> {
    let NewResolution { admin_notes, technician_photo_url } = input;
    let resolved_at = Utc::now();

    let at_str  = encode_dt(resolved_at);
    let notes_c = admin_notes.clone();
    let photo_c = technician_photo_url.clone();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(raw) = get_request_row(&tx, request_id)? else {
          return Ok(Err(Error::RequestNotFound(request_id)));
        };
        let current = match raw.into_request() {
          Ok(r) => r,
          Err(e) => return Ok(Err(e)),
        };

        if let Err(deny) = policy::authorize(
          Some(&actor),
          Action::CreateResolution,
          Some(&current),
        ) {
          return Ok(Err(Error::Forbidden(deny)));
        }

        // Duplicate check before the status check: a second resolve of an
        // already-resolved request is a conflict, not a bad transition.
        if get_resolution_row(&tx, request_id)?.is_some() {
          return Ok(Err(Error::DuplicateResolution(request_id)));
        }
        if current.status != Status::InProgress {
          return Ok(Err(Error::Transition(
            lifecycle::TransitionError::Invalid {
              from: current.status,
              to:   Status::Resolved,
            },
          )));
        }

        tx.execute(
          "INSERT INTO resolutions
             (request_id, admin_notes, technician_photo_url, resolved_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![request_id, notes_c, photo_c, at_str],
        )?;
        let resolution_id = tx.last_insert_rowid();

        tx.execute(
          "UPDATE requests SET status = 'RESOLVED' WHERE id = ?1",
          params![request_id],
        )?;

        tx.commit()?;
        Ok(Ok(resolution_id))
      })
      .await??;

    Ok(Resolution {
      id,
      request_id,
      admin_notes,
      technician_photo_url,
      resolved_at,
    })
  }

  async fn append_resolution_notes(
    &self,
    request_id: i64,
    notes: String,
  ) -> Result<Resolution> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(existing) = get_resolution_row(&tx, request_id)? else {
          return Ok(Err(Error::ResolutionNotFound(request_id)));
        };

        let combined = match existing.admin_notes {
          Some(prev) if !prev.is_empty() => format!("{prev}\n{notes}"),
          _ => notes,
        };
        tx.execute(
          "UPDATE resolutions SET admin_notes = ?1 WHERE request_id = ?2",
          params![combined, request_id],
        )?;

        let Some(raw) = get_resolution_row(&tx, request_id)? else {
          return Ok(Err(Error::ResolutionNotFound(request_id)));
        };
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await??;

    raw.into_resolution()
  }

  async fn list_resolutions(
    &self,
    request_ids: Vec<i64>,
  ) -> Result<Vec<Resolution>> {
    if request_ids.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = vec!["?"; request_ids.len()].join(", ");
    let sql = format!(
      "SELECT id, request_id, admin_notes, technician_photo_url, resolved_at
       FROM resolutions WHERE request_id IN ({placeholders})
       ORDER BY request_id ASC"
    );

    let raws: Vec<RawResolution> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(request_ids.iter()), resolution_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResolution::into_resolution).collect()
  }
}
