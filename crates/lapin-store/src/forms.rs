//! CRUD operations for [`Form`] records.
//!
//! Forms are created in draft and edited freely; publishing is explicit
//! and stamps `published_at` exactly once.  Edits to a published form
//! apply live -- the schema keeps a single publish timestamp and no
//! revision history.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Form;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a draft form with empty documents.
    ///
    /// The slug only needs to be unique within the owning business; two
    /// businesses can both have a `contact` form.
    pub fn create_form(
        &self,
        business_id: Uuid,
        title: &str,
        slug: &str,
        created_by: Option<Uuid>,
    ) -> Result<Form> {
        let form = Form {
            id: Uuid::new_v4(),
            business_id,
            title: title.to_string(),
            description: None,
            slug: slug.to_string(),
            schema: Value::Object(serde_json::Map::new()),
            settings: Value::Object(serde_json::Map::new()),
            conditional_logic: Value::Object(serde_json::Map::new()),
            is_active: true,
            is_published: false,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published_at: None,
        };

        self.conn()
            .execute(
                "INSERT INTO forms (id, business_id, title, description, slug,
                                    schema, settings, conditional_logic,
                                    is_active, is_published, created_by,
                                    created_at, updated_at, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    form.id.to_string(),
                    form.business_id.to_string(),
                    form.title,
                    form.description,
                    form.slug,
                    serde_json::to_string(&form.schema)?,
                    serde_json::to_string(&form.settings)?,
                    serde_json::to_string(&form.conditional_logic)?,
                    form.is_active as i32,
                    form.is_published as i32,
                    form.created_by.map(|u| u.to_string()),
                    form.created_at.to_rfc3339(),
                    form.updated_at.to_rfc3339(),
                    Option::<String>::None,
                ],
            )
            .map_err(|e| translate_form_insert_err(e, business_id, slug))?;

        Ok(form)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single form by UUID.
    pub fn get_form(&self, id: Uuid) -> Result<Form> {
        self.conn()
            .query_row(
                &format!("{FORM_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                row_to_form,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch a form by its slug within one business.
    pub fn get_form_by_slug(&self, business_id: Uuid, slug: &str) -> Result<Form> {
        self.conn()
            .query_row(
                &format!("{FORM_COLUMNS} WHERE business_id = ?1 AND slug = ?2"),
                params![business_id.to_string(), slug],
                row_to_form,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List a business's forms, newest first.
    pub fn list_forms_for_business(&self, business_id: Uuid) -> Result<Vec<Form>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(
                "{FORM_COLUMNS} WHERE business_id = ?1 ORDER BY created_at DESC"
            ))?;

        let rows = stmt.query_map(params![business_id.to_string()], row_to_form)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the opaque schema document.  Returns `true` if a row changed.
    pub fn update_form_schema(&self, id: Uuid, schema: &Value) -> Result<bool> {
        self.update_form_document(id, "schema", schema)
    }

    /// Replace the opaque settings document.
    pub fn update_form_settings(&self, id: Uuid, settings: &Value) -> Result<bool> {
        self.update_form_document(id, "settings", settings)
    }

    /// Replace the opaque conditional-logic document.
    pub fn update_form_logic(&self, id: Uuid, logic: &Value) -> Result<bool> {
        self.update_form_document(id, "conditional_logic", logic)
    }

    /// Update title and description.
    pub fn update_form_details(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE forms SET title = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                title,
                description,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn set_form_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE forms SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), is_active as i32, Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    fn update_form_document(&self, id: Uuid, column: &str, document: &Value) -> Result<bool> {
        // column comes from the three fixed callers above, never from input
        let affected = self.conn().execute(
            &format!("UPDATE forms SET {column} = ?2, updated_at = ?3 WHERE id = ?1"),
            params![
                id.to_string(),
                serde_json::to_string(document)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Publish lifecycle
    // ------------------------------------------------------------------

    /// Publish a form.
    ///
    /// Fails with [`StoreError::EmptySchema`] when the schema document has
    /// no fields.  `published_at` is stamped only on the first publish;
    /// republishing after an unpublish keeps the original timestamp.
    pub fn publish_form(&self, id: Uuid) -> Result<Form> {
        let tx = self.conn().unchecked_transaction()?;

        let mut form = self.get_form(id)?;

        if !schema_has_fields(&form.schema) {
            return Err(StoreError::EmptySchema(id));
        }

        let now = Utc::now();
        form.is_published = true;
        form.published_at = Some(form.published_at.unwrap_or(now));
        form.updated_at = now;

        tx.execute(
            "UPDATE forms SET is_published = 1, published_at = ?2, updated_at = ?3
             WHERE id = ?1",
            params![
                id.to_string(),
                form.published_at.map(|t| t.to_rfc3339()),
                form.updated_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(form)
    }

    /// Take a form offline.  `published_at` is preserved as history.
    pub fn unpublish_form(&self, id: Uuid) -> Result<Form> {
        let tx = self.conn().unchecked_transaction()?;

        let mut form = self.get_form(id)?;
        form.is_published = false;
        form.updated_at = Utc::now();

        tx.execute(
            "UPDATE forms SET is_published = 0, updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), form.updated_at.to_rfc3339()],
        )?;

        tx.commit()?;
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const FORM_COLUMNS: &str = "SELECT id, business_id, title, description, slug,
        schema, settings, conditional_logic,
        is_active, is_published, created_by,
        created_at, updated_at, published_at
 FROM forms";

/// Whether an opaque schema document contains at least one field.
///
/// The store stays agnostic to the builder's layout: a non-empty array, an
/// object with a non-empty `fields` collection, or a non-empty object
/// without a `fields` entry all count.  `null`, scalars, `{}`, `[]` and
/// `{"fields": []}` do not.
fn schema_has_fields(schema: &Value) -> bool {
    match schema {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => match map.get("fields") {
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
            Some(_) => false,
            None => !map.is_empty(),
        },
        _ => false,
    }
}

/// Map constraint violations on form insert to typed errors.
fn translate_form_insert_err(e: rusqlite::Error, business_id: Uuid, slug: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(ref msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            if msg.contains("forms.business_id, forms.slug") {
                StoreError::DuplicateFormSlug {
                    business_id,
                    slug: slug.to_string(),
                }
            } else if msg.contains("FOREIGN KEY") {
                // no such business (or creator)
                StoreError::NotFound
            } else {
                StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, Some(msg.clone())))
            }
        }
        other => StoreError::Sqlite(other),
    }
}

fn row_to_form(row: &rusqlite::Row<'_>) -> rusqlite::Result<Form> {
    let id_str: String = row.get(0)?;
    let business_id_str: String = row.get(1)?;
    let title: String = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    let slug: String = row.get(4)?;
    let schema_str: String = row.get(5)?;
    let settings_str: String = row.get(6)?;
    let logic_str: String = row.get(7)?;
    let is_active_int: i32 = row.get(8)?;
    let is_published_int: i32 = row.get(9)?;
    let created_by_str: Option<String> = row.get(10)?;
    let created_str: String = row.get(11)?;
    let updated_str: String = row.get(12)?;
    let published_str: Option<String> = row.get(13)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let business_id = Uuid::parse_str(&business_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let schema: Value = serde_json::from_str(&schema_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let settings: Value = serde_json::from_str(&settings_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let conditional_logic: Value = serde_json::from_str(&logic_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_by = created_by_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let published_at = published_str
        .map(|s| {
            DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc))
        })
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Form {
        id,
        business_id,
        title,
        description,
        slug,
        schema,
        settings,
        conditional_logic,
        is_active: is_active_int != 0,
        is_published: is_published_int != 0,
        created_by,
        created_at,
        updated_at,
        published_at,
    })
}
