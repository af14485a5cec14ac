//! # lapin-store
//!
//! Tenant data store for Lapin Forms, backed by SQLite.
//!
//! Businesses are the tenant roots; users, forms and submissions hang off
//! them.  The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers enforcing the
//! cross-entity invariants the storage engine cannot express structurally:
//! slug uniqueness scoped to a business, role/business pairing, the
//! publish lifecycle, tenant-consistent denormalization and the submission
//! status machine.  Submission payloads are encrypted at rest; everything
//! else is plain rows.

pub mod businesses;
pub mod database;
pub mod forms;
pub mod migrations;
pub mod models;
pub mod submissions;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
