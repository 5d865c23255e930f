use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use motorlot_core::{MotorlotError, MotorlotResult};

use crate::lock;

const CONFIG_FILE_NAME: &str = "motorlot.json";
/// SQLite file used when the config names none, relative to the datastore directory.
pub const DEFAULT_SQLITE_NAME: &str = "motorlot.sqlite";
const FAILPOINT_PREFIXES: [&str; 3] = ["migrate:", "rollback:", "seed:"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Label written into the lock table; defaults to a per-process token.
    pub lock_holder: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotorlotConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    #[serde(default)]
    pub migration: Option<MigrationConfig>,
    pub failpoints: Option<Vec<String>>,
}

impl MotorlotConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            migration: None,
            failpoints: None,
        }
    }

    /// Reads `motorlot.json` from the datastore directory, writing a SQLite default on first
    /// use. The default names its database relative to the directory so the datastore can move.
    pub fn load_or_init(datastore: &Path) -> MotorlotResult<Self> {
        fs::create_dir_all(datastore).map_err(|err| {
            MotorlotError::storage(format!("create datastore {}: {err}", datastore.display()))
        })?;
        let path = datastore.join(CONFIG_FILE_NAME);
        let config = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<MotorlotConfig>(&raw)
                .map_err(|err| MotorlotError::invalid(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let config = MotorlotConfig::default_sqlite(DEFAULT_SQLITE_NAME);
                let payload = serde_json::to_string_pretty(&config)
                    .map_err(|err| MotorlotError::storage(format!("serialize config: {err}")))?;
                fs::write(&path, payload).map_err(|err| {
                    MotorlotError::storage(format!("write {}: {err}", path.display()))
                })?;
                log::info!("initialised datastore config at {}", path.display());
                config
            }
            Err(err) => {
                return Err(MotorlotError::storage(format!(
                    "read {}: {err}",
                    path.display()
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would only fail once a migration or seed is under way.
    pub fn validate(&self) -> MotorlotResult<()> {
        for key in self.failpoints.iter().flatten() {
            let known = FAILPOINT_PREFIXES.iter().any(|prefix| {
                key.strip_prefix(prefix)
                    .is_some_and(|target| !target.trim().is_empty())
            });
            if !known {
                return Err(MotorlotError::invalid(format!(
                    "unknown failpoint '{key}', expected migrate:<version>, \
                     rollback:<version> or seed:<name>"
                )));
            }
        }
        if self.lock_holder().is_some_and(|holder| holder.trim().is_empty()) {
            return Err(MotorlotError::invalid("migration.lock_holder is blank"));
        }
        if self.connection_url().is_some_and(|url| url.trim().is_empty()) {
            return Err(MotorlotError::invalid(format!(
                "{} datastore has no url",
                self.backend_name()
            )));
        }
        Ok(())
    }

    pub fn sqlite_path(&self, datastore: &Path) -> MotorlotResult<PathBuf> {
        let DatabaseConfig::Sqlite { path } = &self.database else {
            return Err(MotorlotError::invalid(format!(
                "{} datastore has no sqlite file",
                self.backend_name()
            )));
        };
        let file = PathBuf::from(path.as_deref().unwrap_or(DEFAULT_SQLITE_NAME));
        Ok(if file.is_absolute() {
            file
        } else {
            datastore.join(file)
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Some(url.as_str()),
        }
    }

    /// Configured migration lock label, if any.
    pub fn lock_holder(&self) -> Option<&str> {
        self.migration
            .as_ref()
            .and_then(|migration| migration.lock_holder.as_deref())
    }

    /// Label this process writes into the migration lock.
    pub fn resolved_lock_holder(&self) -> String {
        self.lock_holder()
            .map(str::to_string)
            .unwrap_or_else(lock::default_holder)
    }
}
