//! libsql-backed key registry.
//!
//! The `UNIQUE` constraint on `table_name` is what makes first-use
//! registration a single-winner operation across every process sharing the
//! database; a constraint violation is surfaced as [`RegistryInsert::Conflict`],
//! not as an error.

use libsql::params;

use crate::error::WardenError;
use crate::logic::master_key::WrappedMasterKey;
use crate::repository::{CreateMasterKeyRecord, KeyRegistryLike, RegistryInsert};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS master_key (
    id TEXT PRIMARY KEY,
    table_name TEXT NOT NULL UNIQUE,
    wrapped_master_key TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

#[derive(Clone)]
pub struct Repository {
    conn: libsql::Connection,
}

impl Repository {
    pub fn new(conn: libsql::Connection) -> Self {
        Self { conn }
    }

    /// Open (or create) a registry database at `path` and apply the schema.
    /// Pass `":memory:"` for an in-process database. The returned
    /// [`libsql::Database`] must be kept alive alongside the repository.
    pub async fn connect(path: &str) -> Result<(libsql::Database, Self), WardenError> {
        let db = libsql::Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        let repo = Self::new(conn);
        repo.migrate().await?;
        Ok((db, repo))
    }

    pub async fn migrate(&self) -> Result<(), WardenError> {
        self.conn.execute(SCHEMA, ()).await?;
        Ok(())
    }

    /// Number of registered master keys.
    pub async fn count_master_keys(&self) -> Result<i64, WardenError> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM master_key", ()).await?;
        let row = rows.next().await?.ok_or_else(|| WardenError::Repository {
            msg: "COUNT query returned no rows".to_string(),
            source: None,
        })?;
        Ok(row.get::<i64>(0)?)
    }
}

fn is_unique_violation(err: &libsql::Error) -> bool {
    matches!(err, libsql::Error::SqliteFailure(_, msg) if msg.contains("UNIQUE constraint failed"))
}

#[async_trait::async_trait]
impl KeyRegistryLike for Repository {
    async fn lookup_master_key_id(&self, table: &str) -> Result<Option<String>, WardenError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM master_key WHERE table_name = ?1",
                params![table.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn fetch_wrapped_master_key(
        &self,
        master_key_id: &str,
    ) -> Result<WrappedMasterKey, WardenError> {
        let mut rows = self
            .conn
            .query(
                "SELECT wrapped_master_key FROM master_key WHERE id = ?1",
                params![master_key_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(WrappedMasterKey(row.get::<String>(0)?)),
            None => Err(WardenError::Repository {
                msg: format!("master key {master_key_id} not found"),
                source: None,
            }),
        }
    }

    async fn insert_master_key(
        &self,
        record: &CreateMasterKeyRecord,
    ) -> Result<RegistryInsert, WardenError> {
        let result = self
            .conn
            .execute(
                "INSERT INTO master_key (id, table_name, wrapped_master_key, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.master_key_id.clone(),
                    record.table.clone(),
                    record.wrapped_master_key.0.clone(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(RegistryInsert::Created(record.master_key_id.clone())),
            Err(err) if is_unique_violation(&err) => Ok(RegistryInsert::Conflict),
            Err(err) => Err(err.into()),
        }
    }
}
