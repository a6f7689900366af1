//! Verification record persistence.
//!
//! [`RecordStore`] is the narrow interface the issuer and verifier use to
//! reach an external keyed collection. It holds no business logic: the
//! one-record-per-subject rule is enforced by the issuer through
//! lookup-then-replace, and expiry cleanup belongs to the backend.

pub mod memory;
pub mod record;

pub use memory::MemoryRecordStore;
pub use record::VerificationRecord;

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Keyed access to verification records by subject and by record id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record currently held for `subject`.
    async fn find_by_subject(
        &self,
        subject: &Value,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// Find a record by its id (a token's `kid`).
    async fn find_by_id(&self, id: &str) -> Result<Option<VerificationRecord>, StoreError>;

    /// Insert a new record.
    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Replace the record stored under `id` with `record`. The replacement
    /// may carry a different id. Unknown ids are a no-op.
    async fn replace(&self, id: &str, record: &VerificationRecord) -> Result<(), StoreError>;
}
