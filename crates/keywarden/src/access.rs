//! The access-control gate in front of every key operation.
//!
//! Both checks run before any key material is touched: `authenticate`
//! validates the caller's token, `authorize` validates the token's
//! permission on a specific (table, column) pair.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WardenError;

#[async_trait::async_trait]
pub trait AccessControlLike: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<bool, WardenError>;

    async fn authorize(&self, token: &str, table: &str, column: &str)
    -> Result<bool, WardenError>;
}

/// A single (table, column) permission. `column` may be `"*"` to grant a
/// whole table, and a `("*", "*")` grant covers everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnGrant {
    pub table: String,
    pub column: String,
}

/// Access policy document: token -> granted columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub tokens: HashMap<String, Vec<ColumnGrant>>,
}

/// Policy-file-backed access control. A token authenticates iff it appears
/// in the policy; it is authorized for exactly the columns it was granted.
pub struct StaticAccessControl {
    grants: HashMap<String, HashSet<(String, String)>>,
}

impl StaticAccessControl {
    pub fn new(policy: AccessPolicy) -> Self {
        let grants = policy
            .tokens
            .into_iter()
            .map(|(token, columns)| {
                let set = columns
                    .into_iter()
                    .map(|grant| (grant.table, grant.column))
                    .collect();
                (token, set)
            })
            .collect();
        Self { grants }
    }

    pub fn from_path(path: &Path) -> Result<Self, WardenError> {
        let raw = std::fs::read_to_string(path)?;
        let policy: AccessPolicy = serde_json::from_str(&raw)?;
        Ok(Self::new(policy))
    }
}

#[async_trait::async_trait]
impl AccessControlLike for StaticAccessControl {
    async fn authenticate(&self, token: &str) -> Result<bool, WardenError> {
        Ok(self.grants.contains_key(token))
    }

    async fn authorize(
        &self,
        token: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, WardenError> {
        let Some(grants) = self.grants.get(token) else {
            return Ok(false);
        };
        Ok(grants.contains(&(table.to_string(), column.to_string()))
            || grants.contains(&(table.to_string(), "*".to_string()))
            || grants.contains(&("*".to_string(), "*".to_string())))
    }
}
