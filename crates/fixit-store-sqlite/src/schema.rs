//! SQL schema for the fixit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY,
    username       TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,
    role           TEXT NOT NULL,      -- 'STUDENT' | 'TECHNICIAN' | 'ADMIN'
    password_hash  TEXT NOT NULL,      -- argon2 PHC string; opaque here
    created_at     TEXT NOT NULL       -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS categories (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requests (
    id           INTEGER PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    location     TEXT NOT NULL,
    urgency      TEXT NOT NULL,        -- 'LOW' | 'MEDIUM' | 'HIGH'
    status       TEXT NOT NULL,        -- 'PENDING' | 'IN_PROGRESS' | 'RESOLVED' | 'CANCELLED'
    user_id      INTEGER NOT NULL REFERENCES users(id),
    assigned_to  INTEGER REFERENCES users(id),
    category_id  INTEGER REFERENCES categories(id) ON DELETE SET NULL,
    photo_url    TEXT,
    created_at   TEXT NOT NULL
);

-- At most one resolution per request; created only together with the
-- transition into RESOLVED.
CREATE TABLE IF NOT EXISTS resolutions (
    id                    INTEGER PRIMARY KEY,
    request_id            INTEGER NOT NULL UNIQUE REFERENCES requests(id),
    admin_notes           TEXT,
    technician_photo_url  TEXT,
    resolved_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_user_idx     ON requests(user_id);
CREATE INDEX IF NOT EXISTS requests_assigned_idx ON requests(assigned_to);
CREATE INDEX IF NOT EXISTS requests_status_idx   ON requests(status);

PRAGMA user_version = 1;
";
