//! CRUD operations for [`User`] records.
//!
//! The store enforces the role/business pairing: a business admin must
//! point at an existing, active business.  Privilege changes are gated by
//! the caller through [`lapin_shared::policy::can_access`]; the store only
//! keeps the pairing consistent.

use chrono::{DateTime, Utc};
use lapin_shared::Role;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Create a new admin user.
    ///
    /// Fails with [`StoreError::InvalidRoleBusinessPairing`] when a
    /// business admin has no business, or the business is missing or
    /// deactivated.  Super admins may carry an affiliation or not;
    /// forbidding it is deployment policy, decided upstream.
    pub fn create_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        role: Role,
        business_id: Option<Uuid>,
    ) -> Result<User> {
        let tx = self.conn().unchecked_transaction()?;

        check_role_pairing(&tx, role, business_id)?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            role,
            business_id,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        tx.execute(
            "INSERT INTO users (id, email, full_name, role, business_id,
                                is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.email,
                user.full_name,
                user.role.as_str(),
                user.business_id.map(|b| b.to_string()),
                user.is_active as i32,
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| translate_email_conflict(e, email))?;

        tx.commit()?;
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, email, full_name, role, business_id,
                        is_active, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, email, full_name, role, business_id,
                        is_active, created_at, updated_at
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List the admins of one business, ordered by email.
    pub fn list_users_for_business(&self, business_id: Uuid) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, email, full_name, role, business_id,
                    is_active, created_at, updated_at
             FROM users
             WHERE business_id = ?1
             ORDER BY email ASC",
        )?;

        let rows = stmt.query_map(params![business_id.to_string()], row_to_user)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), is_active as i32, Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// Change a user's role and affiliation, re-validating the pairing.
    pub fn set_user_role(
        &self,
        id: Uuid,
        role: Role,
        business_id: Option<Uuid>,
    ) -> Result<bool> {
        let tx = self.conn().unchecked_transaction()?;

        check_role_pairing(&tx, role, business_id)?;

        let affected = tx.execute(
            "UPDATE users SET role = ?2, business_id = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                role.as_str(),
                business_id.map(|b| b.to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(affected > 0)
    }
}

/// Business admins need an existing, active business.
fn check_role_pairing(
    conn: &rusqlite::Connection,
    role: Role,
    business_id: Option<Uuid>,
) -> Result<()> {
    if role != Role::BusinessAdmin {
        return Ok(());
    }

    let business_id = business_id.ok_or_else(|| {
        StoreError::InvalidRoleBusinessPairing("business admin requires a business".into())
    })?;

    let is_active: Option<i32> = conn
        .query_row(
            "SELECT is_active FROM businesses WHERE id = ?1",
            params![business_id.to_string()],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::Sqlite(other)),
        })?;

    match is_active {
        None => Err(StoreError::InvalidRoleBusinessPairing(format!(
            "business {business_id} does not exist"
        ))),
        Some(0) => Err(StoreError::InvalidRoleBusinessPairing(format!(
            "business {business_id} is deactivated"
        ))),
        Some(_) => Ok(()),
    }
}

/// Map a unique-index violation on `users.email` to the typed error.
fn translate_email_conflict(e: rusqlite::Error, email: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, Some(ref msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("users.email") =>
        {
            StoreError::DuplicateEmail(email.to_string())
        }
        other => StoreError::Sqlite(other),
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let email: String = row.get(1)?;
    let full_name: Option<String> = row.get(2)?;
    let role_str: String = row.get(3)?;
    let business_id_str: Option<String> = row.get(4)?;
    let is_active_int: i32 = row.get(5)?;
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let role: Role = role_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let business_id = business_id_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id,
        email,
        full_name,
        role,
        business_id,
        is_active: is_active_int != 0,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db"), &[0xAB; 32]).unwrap();
        (dir, db)
    }

    #[test]
    fn super_admin_needs_no_business() {
        let (_dir, db) = test_db();

        let user = db
            .create_user("root@lapin.dev", Some("Root"), Role::SuperAdmin, None)
            .unwrap();
        assert_eq!(user.role, Role::SuperAdmin);
        assert!(user.business_id.is_none());
    }

    #[test]
    fn business_admin_requires_business() {
        let (_dir, db) = test_db();

        let err = db
            .create_user("admin@acme.com", None, Role::BusinessAdmin, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoleBusinessPairing(_)));
    }

    #[test]
    fn business_admin_rejects_missing_business() {
        let (_dir, db) = test_db();

        let err = db
            .create_user(
                "admin@acme.com",
                None,
                Role::BusinessAdmin,
                Some(Uuid::new_v4()),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoleBusinessPairing(_)));
    }

    #[test]
    fn business_admin_rejects_deactivated_business() {
        let (_dir, db) = test_db();

        let business = db.create_business("Gone", "gone").unwrap();
        db.set_business_active(business.id, false).unwrap();

        let err = db
            .create_user(
                "admin@gone.com",
                None,
                Role::BusinessAdmin,
                Some(business.id),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoleBusinessPairing(_)));
    }

    #[test]
    fn business_admin_with_active_business() {
        let (_dir, db) = test_db();

        let business = db.create_business("Acme", "acme").unwrap();
        let user = db
            .create_user(
                "admin@acme.com",
                Some("Acme Admin"),
                Role::BusinessAdmin,
                Some(business.id),
            )
            .unwrap();

        assert_eq!(user.business_id, Some(business.id));
        assert_eq!(db.get_user_by_email("admin@acme.com").unwrap(), user);
        assert_eq!(db.list_users_for_business(business.id).unwrap(), vec![user]);
    }

    #[test]
    fn duplicate_email_is_typed() {
        let (_dir, db) = test_db();

        db.create_user("dup@lapin.dev", None, Role::SuperAdmin, None)
            .unwrap();
        let err = db
            .create_user("dup@lapin.dev", None, Role::SuperAdmin, None)
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateEmail(ref e) if e == "dup@lapin.dev"));
    }

    #[test]
    fn role_change_revalidates_pairing() {
        let (_dir, db) = test_db();

        let user = db
            .create_user("promote@lapin.dev", None, Role::SuperAdmin, None)
            .unwrap();

        // demotion to business admin without a business must fail
        let err = db
            .set_user_role(user.id, Role::BusinessAdmin, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoleBusinessPairing(_)));

        let business = db.create_business("Home", "home").unwrap();
        assert!(db
            .set_user_role(user.id, Role::BusinessAdmin, Some(business.id))
            .unwrap());
        assert_eq!(db.get_user(user.id).unwrap().role, Role::BusinessAdmin);
    }
}
