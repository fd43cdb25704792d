// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations on the `students`
//! collection.

use crate::db::{collections, document_id, StudentStore, StudentWrite, TimestampWrite, ORDER_FIELD};
use crate::error::AppError;
use crate::models::student::fields;
use crate::models::{normalize, StoredStudent};
use chrono::{DateTime, Utc};
use firestore::FirestoreTransformServerValue;
use serde::{Deserialize, Serialize};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Stored shape of a student document.
///
/// Every field is optional on read so that hand-edited documents still
/// load; values are normalized before they reach the cache. Timestamps
/// are Firestore timestamps (an RFC3339 string also reads back).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StudentDocument {
    student_number: String,
    name: String,
    section: String,
    email: String,
    pw: String,
    table_color: String,
    chromebook_number: String,
    note: String,
    #[serde(
        with = "firestore::serialize_as_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<DateTime<Utc>>,
    #[serde(
        with = "firestore::serialize_as_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    updated_at: Option<DateTime<Utc>>,
}

impl StudentDocument {
    /// Body of a write. Server-stamped timestamps are left out here and
    /// set by field transforms instead.
    fn from_write(write: &StudentWrite) -> Self {
        let record = &write.record;
        Self {
            student_number: record.student_number.clone(),
            name: record.name.clone(),
            section: record.section.clone(),
            email: record.email.clone(),
            pw: record.secret.clone(),
            table_color: record.table_color.as_str().to_string(),
            chromebook_number: record.device_number.clone(),
            note: record.note.clone(),
            created_at: match write.created_at {
                Some(TimestampWrite::Keep(value)) => Some(value),
                _ => None,
            },
            updated_at: None,
        }
    }

    fn into_stored(self) -> StoredStudent {
        let created_at = self.created_at;
        let updated_at = self.updated_at;
        // Round-trip through the field map so remote data gets the same
        // coercion as form and CSV input.
        let fields = serde_json::to_value(&self)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();
        StoredStudent {
            record: normalize(&fields),
            created_at,
            updated_at,
        }
    }
}

/// Update mask for a write: the record fields, plus `createdAt` when an
/// existing value is written back. Fields outside the mask are kept.
fn update_mask(write: &StudentWrite) -> Vec<&'static str> {
    let mut mask = fields::ALL.to_vec();
    if matches!(write.created_at, Some(TimestampWrite::Keep(_))) {
        mask.push(CREATED_AT);
    }
    mask
}

/// Fields stamped with the commit time.
fn server_stamped(write: &StudentWrite) -> Vec<&'static str> {
    let mut stamped = vec![UPDATED_AT];
    if matches!(write.created_at, Some(TimestampWrite::ServerNow)) {
        stamped.push(CREATED_AT);
    }
    stamped
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

impl StudentStore for FirestoreDb {
    async fn list_students(&self) -> Result<Vec<StoredStudent>, AppError> {
        let docs: Vec<StudentDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::STUDENTS)
            .order_by([(ORDER_FIELD, firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().map(StudentDocument::into_stored).collect())
    }

    async fn get_student(&self, student_number: &str) -> Result<Option<StoredStudent>, AppError> {
        let doc: Option<StudentDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STUDENTS)
            .obj()
            .one(&document_id(student_number))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(StudentDocument::into_stored))
    }

    async fn put_student(&self, write: &StudentWrite) -> Result<(), AppError> {
        let client = self.get_client()?;
        let doc = StudentDocument::from_write(write);
        let stamped = server_stamped(write);

        // Object updates only carry field transforms inside a transaction.
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .fields(update_mask(write))
            .in_col(collections::STUDENTS)
            .document_id(document_id(&write.record.student_number))
            .object(&doc)
            .transforms(|t| {
                t.fields(stamped.iter().map(|field| {
                    t.field(field)
                        .server_value(FirestoreTransformServerValue::RequestTime)
                }))
            })
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            student_number = %write.record.student_number,
            "Student document written"
        );
        Ok(())
    }

    async fn delete_student(&self, student_number: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::STUDENTS)
            .document_id(document_id(student_number))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudentRecord, TableColor};

    fn jan_first() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_225_600, 0).unwrap()
    }

    #[test]
    fn test_document_read_normalizes_garbage() {
        let doc = StudentDocument {
            student_number: " 42 ".to_string(),
            name: "Alex".to_string(),
            table_color: "Magenta".to_string(),
            created_at: Some(jan_first()),
            ..Default::default()
        };

        let stored = doc.into_stored();
        assert_eq!(stored.record.student_number, "42");
        assert_eq!(stored.record.table_color, TableColor::Red);
        assert_eq!(stored.created_at, Some(jan_first()));
    }

    #[test]
    fn test_kept_created_at_is_written_back() {
        let record = StudentRecord::from_pairs([("studentNumber", "1"), ("tableColor", "blue")]);
        let write = StudentWrite {
            record,
            created_at: Some(TimestampWrite::Keep(jan_first())),
        };

        let doc = StudentDocument::from_write(&write);
        assert_eq!(doc.created_at, Some(jan_first()));
        assert!(doc.updated_at.is_none());
        assert_eq!(doc.table_color, "blue");

        assert!(update_mask(&write).contains(&CREATED_AT));
        assert_eq!(server_stamped(&write), vec![UPDATED_AT]);
    }

    #[test]
    fn test_new_document_is_server_stamped() {
        let record = StudentRecord::from_pairs([("studentNumber", "1")]);
        let write = StudentWrite::upsert(record, None);

        let doc = StudentDocument::from_write(&write);
        assert!(doc.created_at.is_none());

        let mask = update_mask(&write);
        assert_eq!(mask.len(), fields::ALL.len());
        assert!(!mask.contains(&CREATED_AT));
        assert!(!mask.contains(&UPDATED_AT));
        assert_eq!(server_stamped(&write), vec![UPDATED_AT, CREATED_AT]);
    }

    #[test]
    fn test_untouched_created_at_stays_out_of_mask() {
        let record = StudentRecord::from_pairs([("studentNumber", "1")]);
        let write = StudentWrite {
            record,
            created_at: None,
        };

        assert!(!update_mask(&write).contains(&CREATED_AT));
        assert_eq!(server_stamped(&write), vec![UPDATED_AT]);
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.list_students().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    /// A document written by an older client, with a field this crate
    /// does not model.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct ForeignDocument {
        student_number: String,
        name: String,
        section: String,
        homeroom: String,
    }

    #[tokio::test]
    async fn test_upsert_keeps_unmodelled_fields() {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_err() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }

        let db = FirestoreDb::new("test-project").await.unwrap();
        let client = db.get_client().unwrap();
        let number = format!("merge-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::STUDENTS)
            .document_id(document_id(&number))
            .object(&ForeignDocument {
                student_number: number.clone(),
                name: "Alex".to_string(),
                section: "P3".to_string(),
                homeroom: "Room 4".to_string(),
            })
            .execute()
            .await
            .unwrap();

        let existing = db.get_student(&number).await.unwrap();
        let record = StudentRecord::from_pairs([
            ("studentNumber", number.as_str()),
            ("name", "Alex Santos"),
            ("section", "P3"),
        ]);
        db.put_student(&StudentWrite::upsert(record, existing.as_ref()))
            .await
            .unwrap();

        let raw: Option<ForeignDocument> = client
            .fluent()
            .select()
            .by_id_in(collections::STUDENTS)
            .obj()
            .one(&document_id(&number))
            .await
            .unwrap();
        let raw = raw.unwrap();
        assert_eq!(raw.name, "Alex Santos");
        assert_eq!(raw.homeroom, "Room 4");

        // The older document never had a createdAt, and none is invented.
        let stored = db.get_student(&number).await.unwrap().unwrap();
        assert!(stored.created_at.is_none());
        assert!(stored.updated_at.is_some());
    }
}
