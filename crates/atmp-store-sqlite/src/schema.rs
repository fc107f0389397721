//! SQL schema for the AT/MP SQLite store.
//!
//! Executed once at connection startup. The uniqueness invariants of the
//! workflow are enforced here, not in application code: a UNIQUE column on
//! `audits.dossier_id` and `disputes.dossier_id` closes the race between
//! concurrent requests, and UNIQUE references make the collision-retry path
//! in the store observable as a constraint violation.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    username   TEXT NOT NULL UNIQUE,
    email      TEXT NOT NULL UNIQUE,
    role       TEXT NOT NULL,   -- 'ADMIN' | 'JURISTE' | 'RH' | 'MANAGER'
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dossiers (
    dossier_id       TEXT PRIMARY KEY,
    reference        TEXT NOT NULL UNIQUE,   -- 'DAT-<epoch>[-<hex>]'
    status           TEXT NOT NULL,
    created_by       TEXT NOT NULL REFERENCES users(user_id),
    company_json     TEXT NOT NULL,
    employee_json    TEXT NOT NULL,
    accident_json    TEXT NOT NULL,
    witnesses_json   TEXT NOT NULL DEFAULT '[]',
    third_party_json TEXT,
    health_service   TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- One audit per dossier: UNIQUE(dossier_id), never relaxed.
CREATE TABLE IF NOT EXISTS audits (
    audit_id       TEXT PRIMARY KEY,
    dossier_id     TEXT NOT NULL UNIQUE REFERENCES dossiers(dossier_id),
    auditor_id     TEXT REFERENCES users(user_id),
    status         TEXT NOT NULL,   -- 'NOT_STARTED' | 'IN_PROGRESS' | 'COMPLETED'
    decision       TEXT,            -- set iff status = 'COMPLETED'
    comments       TEXT,
    checklist_json TEXT NOT NULL DEFAULT '[]',
    started_at     TEXT,
    completed_at   TEXT,            -- set iff status = 'COMPLETED'
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- One dispute per dossier: UNIQUE(dossier_id), never relaxed.
CREATE TABLE IF NOT EXISTS disputes (
    dispute_id   TEXT PRIMARY KEY,
    dossier_id   TEXT NOT NULL UNIQUE REFERENCES dossiers(dossier_id),
    reference    TEXT NOT NULL UNIQUE,   -- 'CONT-<epoch>[-<hex>]'
    status       TEXT NOT NULL,          -- 'DRAFT'
    subject_json TEXT NOT NULL,
    steps_json   TEXT NOT NULL DEFAULT '{}',
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS actions (
    action_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dispute_actions (
    dispute_id TEXT NOT NULL REFERENCES disputes(dispute_id),
    action_id  TEXT NOT NULL REFERENCES actions(action_id),
    PRIMARY KEY (dispute_id, action_id)
);

CREATE TABLE IF NOT EXISTS documents (
    document_id   TEXT PRIMARY KEY,
    dispute_id    TEXT NOT NULL REFERENCES disputes(dispute_id),
    uploaded_by   TEXT NOT NULL REFERENCES users(user_id),
    document_type TEXT NOT NULL,
    original_name TEXT NOT NULL,
    blob_handle   TEXT NOT NULL,
    mime_type     TEXT NOT NULL,
    size_bytes    INTEGER NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS dossiers_status_idx   ON dossiers(status);
CREATE INDEX IF NOT EXISTS documents_dispute_idx ON documents(dispute_id);

PRAGMA user_version = 1;
";
