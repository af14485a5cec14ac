//! CRUD operations for [`Business`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Business;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a new business (tenant).
    ///
    /// The slug must be globally unique; it ends up in public form URLs and
    /// is immutable afterwards (the store exposes no slug update).
    pub fn create_business(&self, name: &str, slug: &str) -> Result<Business> {
        let business = Business {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            logo_url: None,
            custom_domain: None,
            theme: Value::Object(serde_json::Map::new()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO businesses (id, name, slug, logo_url, custom_domain, theme,
                                         is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    business.id.to_string(),
                    business.name,
                    business.slug,
                    business.logo_url,
                    business.custom_domain,
                    serde_json::to_string(&business.theme)?,
                    business.is_active as i32,
                    business.created_at.to_rfc3339(),
                    business.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| translate_slug_conflict(e, slug))?;

        Ok(business)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single business by UUID.
    pub fn get_business(&self, id: Uuid) -> Result<Business> {
        self.conn()
            .query_row(
                "SELECT id, name, slug, logo_url, custom_domain, theme,
                        is_active, created_at, updated_at
                 FROM businesses
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_business,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch a single business by its public slug.
    pub fn get_business_by_slug(&self, slug: &str) -> Result<Business> {
        self.conn()
            .query_row(
                "SELECT id, name, slug, logo_url, custom_domain, theme,
                        is_active, created_at, updated_at
                 FROM businesses
                 WHERE slug = ?1",
                params![slug],
                row_to_business,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all businesses, ordered by name.
    pub fn list_businesses(&self) -> Result<Vec<Business>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, slug, logo_url, custom_domain, theme,
                    is_active, created_at, updated_at
             FROM businesses
             ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], row_to_business)?;

        let mut businesses = Vec::new();
        for row in rows {
            businesses.push(row?);
        }
        Ok(businesses)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the opaque theme document.  Returns `true` if a row changed.
    pub fn update_business_theme(&self, id: Uuid, theme: &Value) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE businesses SET theme = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id.to_string(),
                serde_json::to_string(theme)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    // deactivation is the deletion substitute; rows are never removed
    pub fn set_business_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE businesses SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id.to_string(),
                is_active as i32,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a unique-index violation on `businesses.slug` to the typed error.
fn translate_slug_conflict(e: rusqlite::Error, slug: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(ref msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("businesses.slug") =>
        {
            StoreError::DuplicateSlug(slug.to_string())
        }
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`Business`].
fn row_to_business(row: &rusqlite::Row<'_>) -> rusqlite::Result<Business> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let slug: String = row.get(2)?;
    let logo_url: Option<String> = row.get(3)?;
    let custom_domain: Option<String> = row.get(4)?;
    let theme_str: String = row.get(5)?;
    let is_active_int: i32 = row.get(6)?;
    let created_str: String = row.get(7)?;
    let updated_str: String = row.get(8)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let theme: Value = serde_json::from_str(&theme_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Business {
        id,
        name,
        slug,
        logo_url,
        custom_domain,
        theme,
        is_active: is_active_int != 0,
        created_at,
        updated_at,
    })
}
