//! In-memory key registry for development mode and tests.
//!
//! The DashMap entry API gives the same single-winner insert semantics as
//! the sqlite UNIQUE constraint, but scoped to one process.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::WardenError;
use crate::logic::master_key::{MasterKeyRecord, WrappedMasterKey};
use crate::repository::{CreateMasterKeyRecord, KeyRegistryLike, RegistryInsert};

#[derive(Default)]
pub struct InMemoryRegistry {
    by_table: DashMap<String, MasterKeyRecord>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered master keys.
    pub fn record_count(&self) -> usize {
        self.by_table.len()
    }
}

#[async_trait::async_trait]
impl KeyRegistryLike for InMemoryRegistry {
    async fn lookup_master_key_id(&self, table: &str) -> Result<Option<String>, WardenError> {
        Ok(self
            .by_table
            .get(table)
            .map(|record| record.master_key_id.clone()))
    }

    async fn fetch_wrapped_master_key(
        &self,
        master_key_id: &str,
    ) -> Result<WrappedMasterKey, WardenError> {
        self.by_table
            .iter()
            .find(|entry| entry.value().master_key_id == master_key_id)
            .map(|entry| entry.value().wrapped_master_key.clone())
            .ok_or_else(|| WardenError::Repository {
                msg: format!("master key {master_key_id} not found"),
                source: None,
            })
    }

    async fn insert_master_key(
        &self,
        record: &CreateMasterKeyRecord,
    ) -> Result<RegistryInsert, WardenError> {
        match self.by_table.entry(record.table.clone()) {
            Entry::Occupied(_) => Ok(RegistryInsert::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(MasterKeyRecord {
                    master_key_id: record.master_key_id.clone(),
                    table: record.table.clone(),
                    wrapped_master_key: record.wrapped_master_key.clone(),
                    created_at: record.created_at,
                });
                Ok(RegistryInsert::Created(record.master_key_id.clone()))
            }
        }
    }
}
