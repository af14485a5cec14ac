//! CRUD operations for [`Submission`] records.
//!
//! Submissions are append-mostly: ordinary flows never hard-delete them,
//! archival is the deletion substitute.  The `data`/`metadata` documents
//! are encrypted before they touch disk; `duplicate_check_key` stays
//! plaintext so the duplicate lookup works without decrypting history.

use chrono::{DateTime, Utc};
use lapin_shared::crypto::{self, DataKey};
use lapin_shared::SubmissionStatus;
use rusqlite::params;
use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Submission;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Capture a new submission for a form.
    ///
    /// The owning business is resolved from the form and stamped onto the
    /// row, so tenant-scoped queries never need a join.  When
    /// `duplicate_check_key` is present, the row is flagged as a duplicate
    /// iff an earlier submission to the same form carries an equal key;
    /// the lookup and the insert share one transaction.
    pub fn create_submission(
        &self,
        form_id: Uuid,
        data: Value,
        metadata: Value,
        duplicate_check_key: Option<String>,
        signature_url: Option<String>,
    ) -> Result<Submission> {
        let tx = self.conn().unchecked_transaction()?;

        let form = self.get_form(form_id)?;

        let is_duplicate = match duplicate_check_key.as_deref() {
            Some(key) => duplicate_exists(&tx, form_id, key)?,
            None => false,
        };

        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            form_id,
            business_id: form.business_id,
            data,
            metadata,
            signature_url,
            is_duplicate,
            duplicate_check_key,
            status: SubmissionStatus::Draft,
            submitted_at: now,
            created_at: now,
        };

        self.insert_submission_row(&tx, &submission)?;

        tx.commit()?;
        Ok(submission)
    }

    /// Low-level insert for a fully built [`Submission`] (import/restore
    /// flows).
    ///
    /// Verifies that the caller's `business_id` matches the owning form's
    /// ([`StoreError::TenantMismatch`] otherwise).  `is_duplicate` is
    /// recomputed from the rows already present -- replaying a history in
    /// order reproduces the original flags.
    pub fn insert_submission(&self, submission: &Submission) -> Result<Submission> {
        let tx = self.conn().unchecked_transaction()?;

        let form = self.get_form(submission.form_id)?;
        if submission.business_id != form.business_id {
            return Err(StoreError::TenantMismatch {
                submission_business: submission.business_id,
                form_business: form.business_id,
            });
        }

        let is_duplicate = match submission.duplicate_check_key.as_deref() {
            Some(key) => duplicate_exists(&tx, submission.form_id, key)?,
            None => false,
        };

        let stored = Submission {
            is_duplicate,
            ..submission.clone()
        };
        self.insert_submission_row(&tx, &stored)?;

        tx.commit()?;
        Ok(stored)
    }

    fn insert_submission_row(
        &self,
        tx: &rusqlite::Transaction<'_>,
        submission: &Submission,
    ) -> Result<()> {
        let data_cipher = encrypt_document(self.data_key(), &submission.data)?;
        let metadata_cipher = encrypt_document(self.data_key(), &submission.metadata)?;

        tx.execute(
            "INSERT INTO submissions (id, form_id, business_id, data, metadata,
                                      signature_url, is_duplicate, duplicate_check_key,
                                      status, submitted_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                submission.id.to_string(),
                submission.form_id.to_string(),
                submission.business_id.to_string(),
                data_cipher,
                metadata_cipher,
                submission.signature_url,
                submission.is_duplicate as i32,
                submission.duplicate_check_key,
                submission.status.as_str(),
                submission.submitted_at.to_rfc3339(),
                submission.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_submission(&self, id: Uuid) -> Result<Submission> {
        self.conn()
            .query_row(
                &format!("{SUBMISSION_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                |row| row_to_submission(self.data_key(), row),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Page through a form's submissions, newest first.
    pub fn list_submissions_for_form(
        &self,
        form_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Submission>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SUBMISSION_COLUMNS}
             WHERE form_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![form_id.to_string(), limit, offset], |row| {
            row_to_submission(self.data_key(), row)
        })?;

        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    /// Page through every submission under a business, newest first.
    pub fn list_submissions_for_business(
        &self,
        business_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Submission>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SUBMISSION_COLUMNS}
             WHERE business_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![business_id.to_string(), limit, offset], |row| {
            row_to_submission(self.data_key(), row)
        })?;

        let mut submissions = Vec::new();
        for row in rows {
            submissions.push(row?);
        }
        Ok(submissions)
    }

    pub fn count_submissions_for_form(&self, form_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM submissions WHERE form_id = ?1",
            params![form_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Status machine
    // ------------------------------------------------------------------

    /// Move a submission to `next` status.
    ///
    /// Only `draft -> completed` and `completed -> archived` are legal;
    /// finalization re-stamps `submitted_at` so multi-step forms keep the
    /// completion time, not the first-capture time.
    pub fn transition_submission(
        &self,
        id: Uuid,
        next: SubmissionStatus,
    ) -> Result<Submission> {
        let tx = self.conn().unchecked_transaction()?;

        let mut submission = self.get_submission(id)?;

        if !submission.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: submission.status,
                to: next,
            });
        }

        if next == SubmissionStatus::Completed {
            submission.submitted_at = Utc::now();
        }
        submission.status = next;

        tx.execute(
            "UPDATE submissions SET status = ?2, submitted_at = ?3 WHERE id = ?1",
            params![
                id.to_string(),
                submission.status.as_str(),
                submission.submitted_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(submission)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SUBMISSION_COLUMNS: &str = "SELECT id, form_id, business_id, data, metadata,
        signature_url, is_duplicate, duplicate_check_key,
        status, submitted_at, created_at
 FROM submissions";

/// Whether an earlier submission to `form_id` carries `key`.
fn duplicate_exists(
    conn: &rusqlite::Connection,
    form_id: Uuid,
    key: &str,
) -> Result<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM submissions
             WHERE form_id = ?1 AND duplicate_check_key = ?2
         )",
        params![form_id.to_string(), key],
        |row| row.get(0),
    )?;
    Ok(found != 0)
}

fn encrypt_document(key: &DataKey, document: &Value) -> Result<Vec<u8>> {
    let plaintext = serde_json::to_vec(document)?;
    Ok(crypto::encrypt(key, &plaintext)?)
}

fn decrypt_document(key: &DataKey, column: usize, cipher: &[u8]) -> rusqlite::Result<Value> {
    let plaintext = crypto::decrypt(key, cipher).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Blob, Box::new(e))
    })?;
    serde_json::from_slice(&plaintext).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Blob, Box::new(e))
    })
}

fn row_to_submission(key: &DataKey, row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    let id_str: String = row.get(0)?;
    let form_id_str: String = row.get(1)?;
    let business_id_str: String = row.get(2)?;
    let data_cipher: Vec<u8> = row.get(3)?;
    let metadata_cipher: Vec<u8> = row.get(4)?;
    let signature_url: Option<String> = row.get(5)?;
    let is_duplicate_int: i32 = row.get(6)?;
    let duplicate_check_key: Option<String> = row.get(7)?;
    let status_str: String = row.get(8)?;
    let submitted_str: String = row.get(9)?;
    let created_str: String = row.get(10)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let form_id = Uuid::parse_str(&form_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let business_id = Uuid::parse_str(&business_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let data = decrypt_document(key, 3, &data_cipher)?;
    let metadata = decrypt_document(key, 4, &metadata_cipher)?;

    let status: SubmissionStatus = status_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let submitted_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&submitted_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Submission {
        id,
        form_id,
        business_id,
        data,
        metadata,
        signature_url,
        is_duplicate: is_duplicate_int != 0,
        duplicate_check_key,
        status,
        submitted_at,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Form;
    use serde_json::json;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db"), &[0xAB; 32]).unwrap();
        (dir, db)
    }

    fn seed_form(db: &Database) -> Form {
        let business = db.create_business("Acme", "acme").unwrap();
        db.create_form(business.id, "Contact", "contact", None)
            .unwrap()
    }

    #[test]
    fn business_id_stamped_from_form() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let submission = db
            .create_submission(form.id, json!({"name": "Ann"}), json!({}), None, None)
            .unwrap();

        assert_eq!(submission.business_id, form.business_id);
        assert_eq!(submission.status, SubmissionStatus::Draft);
        assert!(!submission.is_duplicate);
    }

    #[test]
    fn payloads_round_trip_encrypted() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let data = json!({
            "zeta": "order matters",
            "alpha": {"nested": [1, 2.5, false, null, {"deep": "value"}]},
            "count": 3
        });
        let metadata = json!({"ip": "203.0.113.9", "user_agent": "Mozilla/5.0", "referrer": null});

        let created = db
            .create_submission(form.id, data.clone(), metadata.clone(), None, None)
            .unwrap();
        let fetched = db.get_submission(created.id).unwrap();

        assert_eq!(fetched.data, data);
        assert_eq!(fetched.metadata, metadata);
        // insertion order of mapping keys survives the round trip
        assert_eq!(
            serde_json::to_string(&fetched.data).unwrap(),
            serde_json::to_string(&data).unwrap()
        );

        // on disk the payload is ciphertext (nonce + body + tag), not JSON
        let raw: Vec<u8> = db
            .conn()
            .query_row(
                "SELECT data FROM submissions WHERE id = ?1",
                params![created.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        let plaintext = serde_json::to_vec(&data).unwrap();
        assert_ne!(raw, plaintext);
        assert_eq!(raw.len(), plaintext.len() + 24 + 16);
    }

    #[test]
    fn duplicate_flagged_on_second_equal_key() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let key = Some("fingerprint-1".to_string());
        let first = db
            .create_submission(form.id, json!({"email": "a@x.com"}), json!({}), key.clone(), None)
            .unwrap();
        let second = db
            .create_submission(form.id, json!({"email": "a@x.com"}), json!({}), key, None)
            .unwrap();

        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert!(!db.get_submission(first.id).unwrap().is_duplicate);
        assert!(db.get_submission(second.id).unwrap().is_duplicate);
    }

    #[test]
    fn null_keys_never_match() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let first = db
            .create_submission(form.id, json!({}), json!({}), None, None)
            .unwrap();
        let second = db
            .create_submission(form.id, json!({}), json!({}), None, None)
            .unwrap();

        assert!(!first.is_duplicate);
        assert!(!second.is_duplicate);
    }

    #[test]
    fn duplicate_keys_scoped_to_form() {
        let (_dir, db) = test_db();
        let business = db.create_business("Acme", "acme").unwrap();
        let form_a = db.create_form(business.id, "A", "a", None).unwrap();
        let form_b = db.create_form(business.id, "B", "b", None).unwrap();

        let key = Some("shared-key".to_string());
        db.create_submission(form_a.id, json!({}), json!({}), key.clone(), None)
            .unwrap();
        let other_form = db
            .create_submission(form_b.id, json!({}), json!({}), key, None)
            .unwrap();

        assert!(!other_form.is_duplicate);
    }

    #[test]
    fn tenant_mismatch_rejected() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);
        let other = db.create_business("Globex", "globex").unwrap();

        let rogue = Submission {
            id: Uuid::new_v4(),
            form_id: form.id,
            business_id: other.id,
            data: json!({}),
            metadata: json!({}),
            signature_url: None,
            is_duplicate: false,
            duplicate_check_key: None,
            status: SubmissionStatus::Draft,
            submitted_at: Utc::now(),
            created_at: Utc::now(),
        };

        let err = db.insert_submission(&rogue).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TenantMismatch { submission_business, form_business }
                if submission_business == other.id && form_business == form.business_id
        ));
    }

    #[test]
    fn finalize_then_archive() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let draft = db
            .create_submission(form.id, json!({"step": 1}), json!({}), None, None)
            .unwrap();

        let completed = db
            .transition_submission(draft.id, SubmissionStatus::Completed)
            .unwrap();
        assert_eq!(completed.status, SubmissionStatus::Completed);
        assert!(completed.submitted_at >= draft.submitted_at);

        let archived = db
            .transition_submission(draft.id, SubmissionStatus::Archived)
            .unwrap();
        assert_eq!(archived.status, SubmissionStatus::Archived);
    }

    #[test]
    fn illegal_transitions_rejected() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        let draft = db
            .create_submission(form.id, json!({}), json!({}), None, None)
            .unwrap();

        // draft cannot skip finalization
        let err = db
            .transition_submission(draft.id, SubmissionStatus::Archived)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: SubmissionStatus::Draft,
                to: SubmissionStatus::Archived
            }
        ));

        db.transition_submission(draft.id, SubmissionStatus::Completed)
            .unwrap();
        db.transition_submission(draft.id, SubmissionStatus::Archived)
            .unwrap();

        // archived is terminal
        for next in [
            SubmissionStatus::Draft,
            SubmissionStatus::Completed,
            SubmissionStatus::Archived,
        ] {
            let err = db.transition_submission(draft.id, next).unwrap_err();
            assert!(matches!(err, StoreError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn listing_pages_and_counts() {
        let (_dir, db) = test_db();
        let form = seed_form(&db);

        for i in 0..5 {
            db.create_submission(form.id, json!({"n": i}), json!({}), None, None)
                .unwrap();
        }

        assert_eq!(db.count_submissions_for_form(form.id).unwrap(), 5);

        let page = db.list_submissions_for_form(form.id, 2, 0).unwrap();
        assert_eq!(page.len(), 2);

        let rest = db.list_submissions_for_form(form.id, 10, 2).unwrap();
        assert_eq!(rest.len(), 3);

        let by_business = db
            .list_submissions_for_business(form.business_id, 10, 0)
            .unwrap();
        assert_eq!(by_business.len(), 5);
    }
}
