//! The key registry: durable table -> wrapped master key mapping.
//!
//! The registry is the only shared state in the service. Its one structural
//! invariant is uniqueness: at most one master key record per table, enforced
//! at the storage layer so that it holds across process instances.

pub mod memory;
pub mod sqlite;

pub use sqlite::Repository;

use chrono::{DateTime, Utc};

use crate::error::WardenError;
use crate::logic::master_key::WrappedMasterKey;

/// Outcome of attempting to claim the master-key slot for a table.
///
/// `Conflict` means another writer holds the slot already (a lost first-use
/// race, or a pre-existing record); the caller must re-read and use the
/// winning record instead of treating this as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryInsert {
    Created(String),
    Conflict,
}

#[derive(Debug, Clone)]
pub struct CreateMasterKeyRecord {
    pub master_key_id: String,
    pub table: String,
    pub wrapped_master_key: WrappedMasterKey,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait KeyRegistryLike: Send + Sync {
    /// Resolve a table to its master key id, if the table is registered.
    async fn lookup_master_key_id(&self, table: &str) -> Result<Option<String>, WardenError>;

    /// Fetch the wrapped master key for a known id. A missing id is an
    /// error: ids only come from `lookup_master_key_id` or
    /// `insert_master_key`, and records are never deleted.
    async fn fetch_wrapped_master_key(
        &self,
        master_key_id: &str,
    ) -> Result<WrappedMasterKey, WardenError>;

    /// Insert a new record, claiming the table's slot. Must be atomic with
    /// respect to concurrent inserts for the same table: exactly one caller
    /// observes `Created`, every other observes `Conflict`.
    async fn insert_master_key(
        &self,
        record: &CreateMasterKeyRecord,
    ) -> Result<RegistryInsert, WardenError>;
}
