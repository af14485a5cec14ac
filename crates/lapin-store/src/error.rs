use lapin_shared::types::UnknownVariant;
use lapin_shared::{CryptoError, SubmissionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error that does not map to a domain invariant.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Another business already owns this slug.
    #[error("Business slug already in use: {0}")]
    DuplicateSlug(String),

    /// Another form in the same business already owns this slug.
    #[error("Form slug already in use within business {business_id}: {slug}")]
    DuplicateFormSlug { business_id: Uuid, slug: String },

    /// Another user already registered this email.
    #[error("Email already in use: {0}")]
    DuplicateEmail(String),

    /// A business admin without a valid active business, or vice versa.
    #[error("Invalid role/business pairing: {0}")]
    InvalidRoleBusinessPairing(String),

    /// Publishing requires a schema with at least one field.
    #[error("Form {0} cannot be published: schema has no fields")]
    EmptySchema(Uuid),

    /// Illegal submission status transition.
    #[error("Invalid submission status transition: {from} -> {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    /// Submission business does not match the owning form's business.
    #[error("Submission business {submission_business} does not match form business {form_business}")]
    TenantMismatch {
        submission_business: Uuid,
        form_business: Uuid,
    },

    /// Payload encryption / decryption failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Opaque document (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// A persisted enum column held an unknown value.
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
