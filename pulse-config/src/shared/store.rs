use serde::Deserialize;

use crate::shared::{PgConnectionConfig, ValidationError};

const fn default_max_connections() -> u32 {
    StoreConfig::DEFAULT_MAX_CONNECTIONS
}

/// Durable store backing the pipeline.
///
/// This intentionally does not implement [`serde::Serialize`] since the Postgres variant
/// carries credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// Events are stored in a Postgres `events` table.
    Postgres {
        /// Connection parameters of the database.
        connection: PgConnectionConfig,
        /// Upper bound of pooled connections shared by the persister and the processor.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
    /// Events are kept in process memory and lost on exit.
    Memory,
}

impl StoreConfig {
    /// Default pool size: one connection per store-facing worker.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StoreConfig::Postgres {
                connection,
                max_connections,
            } => {
                if *max_connections == 0 {
                    return Err(ValidationError::invalid(
                        "store.postgres.max_connections",
                        "must be greater than 0",
                    ));
                }
                connection.validate()
            }
            StoreConfig::Memory => Ok(()),
        }
    }
}
