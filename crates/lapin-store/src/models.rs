//! Domain model structs persisted in the tenant database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to API handlers or admin tooling.  The opaque documents
//! (`theme`, `schema`, `settings`, `conditional_logic`, `data`, `metadata`)
//! are `serde_json::Value` and round-trip verbatim; their internals belong
//! to the builder UI, the logic engine and the analytics pipeline.

use chrono::{DateTime, Utc};
use lapin_shared::{Role, SubmissionStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Business
// ---------------------------------------------------------------------------

/// A tenant.  Owns all users, forms and submissions under it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    /// Unique business identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// URL-safe slug, globally unique and immutable (used in public URLs).
    pub slug: String,
    /// Optional logo reference.
    pub logo_url: Option<String>,
    /// Optional custom domain serving this tenant's forms.
    pub custom_domain: Option<String>,
    /// Opaque theme document (colors, fonts, branding).
    pub theme: Value,
    /// Soft-delete flag; deactivation never removes rows.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An admin account, either deployment-wide or scoped to one business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Globally unique email address.
    pub email: String,
    /// Optional full name.
    pub full_name: Option<String>,
    /// `super_admin` or `business_admin`.
    pub role: Role,
    /// Owning business; required (and active) for business admins.
    pub business_id: Option<Uuid>,
    /// Soft-disable flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// A form owned by a business.  Created in draft, published explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Form {
    /// Unique form identifier.
    pub id: Uuid,
    /// Owning business.
    pub business_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Slug, unique within the owning business.
    pub slug: String,
    /// Opaque field/layout document produced by the builder.
    pub schema: Value,
    /// Opaque settings document (submission limits, notifications, ...).
    pub settings: Value,
    /// Opaque IF-THEN rule document referencing field ids in `schema`.
    pub conditional_logic: Value,
    pub is_active: bool,
    pub is_published: bool,
    /// The admin who created the form, if known.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// First-publish timestamp.  Set exactly once; unpublishing keeps it.
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A captured submission.  `business_id` is denormalized from the owning
/// form so tenant-scoped queries need no join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    /// Unique submission identifier.
    pub id: Uuid,
    /// The form this submission answers.
    pub form_id: Uuid,
    /// Always equal to the owning form's `business_id`.
    pub business_id: Uuid,
    /// Opaque answers document (field id -> answer), encrypted at rest.
    pub data: Value,
    /// Opaque capture context (IP, user agent, referrer), encrypted at rest.
    pub metadata: Value,
    /// Optional signature-image reference.
    pub signature_url: Option<String>,
    /// True iff an earlier submission to the same form carried an equal
    /// non-null `duplicate_check_key`.
    pub is_duplicate: bool,
    /// Deterministic fingerprint of the significant answer fields.
    pub duplicate_check_key: Option<String>,
    pub status: SubmissionStatus,
    /// Finalization time; re-stamped on the `draft -> completed` transition.
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
