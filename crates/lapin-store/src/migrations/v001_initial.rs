//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `businesses`, `users`, `forms` and
//! `submissions`, plus the unique indexes backing the uniqueness
//! invariants (business slug, user email, form slug per business).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Businesses (tenant roots)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS businesses (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    slug          TEXT NOT NULL,              -- URL-safe, globally unique
    logo_url      TEXT,
    custom_domain TEXT,
    theme         TEXT NOT NULL DEFAULT '{}', -- opaque JSON document
    is_active     INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    created_at    TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    updated_at    TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_businesses_slug ON businesses(slug);

-- ----------------------------------------------------------------
-- Users (admin accounts)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    email       TEXT NOT NULL,
    full_name   TEXT,
    role        TEXT NOT NULL
                CHECK (role IN ('super_admin', 'business_admin')),
    business_id TEXT,                         -- nullable FK -> businesses(id)
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,

    FOREIGN KEY (business_id) REFERENCES businesses(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);
CREATE INDEX IF NOT EXISTS idx_users_business ON users(business_id);

-- ----------------------------------------------------------------
-- Forms
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS forms (
    id                TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    business_id       TEXT NOT NULL,              -- FK -> businesses(id)
    title             TEXT NOT NULL,
    description       TEXT,
    slug              TEXT NOT NULL,              -- unique per business
    schema            TEXT NOT NULL DEFAULT '{}', -- opaque JSON: fields/layout
    settings          TEXT NOT NULL DEFAULT '{}', -- opaque JSON: limits, notifications
    conditional_logic TEXT NOT NULL DEFAULT '{}', -- opaque JSON: IF-THEN rules
    is_active         INTEGER NOT NULL DEFAULT 1,
    is_published      INTEGER NOT NULL DEFAULT 0,
    created_by        TEXT,                       -- nullable FK -> users(id)
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    published_at      TEXT,                       -- set once, on first publish

    FOREIGN KEY (business_id) REFERENCES businesses(id),
    FOREIGN KEY (created_by) REFERENCES users(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_forms_business_slug
    ON forms(business_id, slug);

-- ----------------------------------------------------------------
-- Submissions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS submissions (
    id                  TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    form_id             TEXT NOT NULL,              -- FK -> forms(id)
    business_id         TEXT NOT NULL,              -- denormalized from the form
    data                BLOB NOT NULL,              -- encrypted JSON payload
    metadata            BLOB NOT NULL,              -- encrypted JSON context
    signature_url       TEXT,
    is_duplicate        INTEGER NOT NULL DEFAULT 0,
    duplicate_check_key TEXT,                       -- plaintext fingerprint
    status              TEXT NOT NULL DEFAULT 'draft'
                        CHECK (status IN ('draft', 'completed', 'archived')),
    submitted_at        TEXT NOT NULL,
    created_at          TEXT NOT NULL,

    FOREIGN KEY (form_id) REFERENCES forms(id),
    FOREIGN KEY (business_id) REFERENCES businesses(id)
);

CREATE INDEX IF NOT EXISTS idx_submissions_form ON submissions(form_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_submissions_business ON submissions(business_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_submissions_dup_key ON submissions(form_id, duplicate_check_key);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
