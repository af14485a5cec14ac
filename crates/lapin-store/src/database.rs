//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations are run before any other operation.  It also holds the
//! deployment data key used to encrypt submission payloads at rest
//! (XChaCha20-Poly1305 over the `data`/`metadata` documents); the rest of
//! the schema is stored as plain rows so it stays queryable.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use lapin_shared::crypto::DataKey;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    data_key: DataKey,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/lapin/lapin.db`
    /// - macOS:   `~/Library/Application Support/com.lapin.lapin/lapin.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\lapin\lapin\data\lapin.db`
    ///
    /// # Arguments
    /// * `data_key` -- 32-byte key for submission payload encryption,
    ///   parsed from the deployment's `ENCRYPTION_KEY`.
    pub fn new(data_key: &DataKey) -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "lapin", "lapin").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("lapin.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path, data_key)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path, data_key: &DataKey) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            data_key: *data_key,
        })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for transactions or ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// The data key used for submission payload encryption.
    pub(crate) fn data_key(&self) -> &DataKey {
        &self.data_key
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
