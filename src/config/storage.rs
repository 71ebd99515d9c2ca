//! Storage backend selection

use serde::Deserialize;

/// Which storage backend the application runs on
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub kind: StorageKind,
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Process-local tables; contents are lost on exit
    #[default]
    InMemory,
    /// PostgreSQL through the `database` section
    Postgres,
}
