pub mod config;
mod db;
pub mod ddl;
pub mod ledger;
pub mod lock;
pub mod migration;
pub mod models;
pub mod rows;
pub mod runner;
pub mod seed;
pub mod seeds;
pub mod store;

pub use config::{
    DEFAULT_SQLITE_NAME, DatabaseConfig, MigrationConfig, MotorlotConfig, PoolConfig,
};
pub use lock::MigrationLock;
pub use motorlot_core::*;
pub use rows::{DeleteReport, FieldValue, Row, RowStore, Values};
pub use runner::MigrationRunner;
pub use seed::{Seed, SeedConflict, SeedLoader, SeedReport, SeedRow};
pub use store::{BackendCapabilities, MotorlotStore};
