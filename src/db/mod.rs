//! Database layer (Firestore).
//!
//! [`StudentStore`] is the seam between the roster core and the document
//! store. [`FirestoreDb`] is the production adapter; [`MemoryStore`] keeps
//! documents in process for tests and offline runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{StoredStudent, StudentRecord};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const STUDENTS: &str = "students";
}

/// Field the roster collection is ordered by.
pub const ORDER_FIELD: &str = "studentNumber";

/// How a timestamp field is filled in on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampWrite {
    /// Stamp with the store's own clock at commit time.
    ServerNow,
    /// Write this exact value back.
    Keep(DateTime<Utc>),
}

/// One document write. `updatedAt` is always stamped by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentWrite {
    pub record: StudentRecord,
    /// `None` leaves the stored `createdAt` untouched.
    pub created_at: Option<TimestampWrite>,
}

impl StudentWrite {
    /// Build the write for `record`, given what is currently stored.
    ///
    /// A new key gets a fresh `createdAt`; an existing one carries its
    /// value forward.
    pub fn upsert(record: StudentRecord, existing: Option<&StoredStudent>) -> Self {
        let created_at = match existing {
            None => Some(TimestampWrite::ServerNow),
            Some(doc) => doc.created_at.map(TimestampWrite::Keep),
        };
        Self { record, created_at }
    }
}

/// Keyed access to the students collection.
pub trait StudentStore: Clone + Send + Sync + 'static {
    /// All documents, ordered by student number.
    fn list_students(&self) -> impl Future<Output = Result<Vec<StoredStudent>, AppError>> + Send;

    fn get_student(
        &self,
        student_number: &str,
    ) -> impl Future<Output = Result<Option<StoredStudent>, AppError>> + Send;

    /// Create or merge-update the document keyed by the record's number.
    ///
    /// Only the record fields and timestamps are touched; any other field
    /// already on the document is left as it is.
    fn put_student(&self, write: &StudentWrite) -> impl Future<Output = Result<(), AppError>> + Send;

    fn delete_student(&self, student_number: &str)
        -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Ids Firestore refuses outright.
fn is_reserved_id(id: &str) -> bool {
    id == "." || id == ".." || (id.len() >= 4 && id.starts_with("__") && id.ends_with("__"))
}

/// Document id for a student number.
///
/// The number is used as-is whenever Firestore accepts it, so documents
/// keyed by the raw number are found again. Anything else is
/// percent-encoded. A `%` always forces encoding, which keeps an encoded
/// id from colliding with a raw one.
pub fn document_id(student_number: &str) -> String {
    if !is_reserved_id(student_number) && !student_number.contains(['/', '%']) {
        return student_number.to_string();
    }

    let encoded = urlencoding::encode(student_number).into_owned();
    if is_reserved_id(&encoded) {
        encoded.replace('.', "%2E").replace('_', "%5F")
    } else {
        encoded
    }
}
