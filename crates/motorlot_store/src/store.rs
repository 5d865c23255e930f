use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};

use crate::config::{DatabaseConfig, MotorlotConfig};
use crate::rows::RowStore;
use crate::runner::MigrationRunner;
use crate::seed::SeedLoader;
use crate::{migration, models};
use motorlot_core::{MigrationUnit, ModelRegistry, MotorlotError, MotorlotResult, Version};

/// Connection plus the settings every runner, loader and row store built from it shares.
#[derive(Clone, Debug)]
pub struct MotorlotStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
    failpoints: HashSet<String>,
    lock_holder: String,
}

#[derive(Clone, Copy, Debug)]
pub struct BackendCapabilities {
    /// DDL inside a transaction is rolled back with it.
    pub transactional_ddl: bool,
    /// Foreign keys can be added to or dropped from an existing table.
    pub alter_foreign_keys: bool,
    pub returning: bool,
}

impl MotorlotStore {
    /// Opens a datastore directory, writing its default config on first use.
    pub async fn open(datastore: &Path) -> MotorlotResult<Self> {
        let config = MotorlotConfig::load_or_init(datastore)?;
        Self::connect(&config, datastore).await
    }

    /// Opens the configured database. Migrations are not applied here.
    pub async fn connect(config: &MotorlotConfig, base_dir: &Path) -> MotorlotResult<Self> {
        config.validate()?;
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(MotorlotError::from)?;
        let backend = conn.get_database_backend();
        let failpoints = config
            .failpoints
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect::<HashSet<_>>();
        log::debug!("connected to {} datastore", config.backend_name());
        Ok(Self {
            conn,
            backend,
            failpoints,
            lock_holder: config.resolved_lock_holder(),
        })
    }

    pub async fn connect_sqlite(path: &Path) -> MotorlotResult<Self> {
        let config = MotorlotConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        match self.backend {
            DatabaseBackend::Sqlite => BackendCapabilities {
                transactional_ddl: true,
                alter_foreign_keys: false,
                returning: true,
            },
            DatabaseBackend::Postgres => BackendCapabilities {
                transactional_ddl: true,
                alter_foreign_keys: true,
                returning: true,
            },
            DatabaseBackend::MySql => BackendCapabilities {
                transactional_ddl: false,
                alter_foreign_keys: true,
                returning: false,
            },
        }
    }

    /// Runner over an arbitrary unit set. Duplicate versions fail here.
    pub fn runner(&self, units: Vec<MigrationUnit>) -> MotorlotResult<MigrationRunner> {
        Ok(MigrationRunner::new(self.conn.clone(), units)?
            .with_failpoints(self.failpoints.clone())
            .with_holder(self.lock_holder.clone()))
    }

    pub fn lock_holder(&self) -> &str {
        &self.lock_holder
    }

    /// Runner over the marketplace migration catalog.
    pub fn catalog_runner(&self) -> MotorlotResult<MigrationRunner> {
        self.runner(migration::catalog())
    }

    pub async fn migrate_to_latest(&self) -> MotorlotResult<Vec<Version>> {
        self.catalog_runner()?.apply_forward(None).await
    }

    pub fn rows(&self, registry: Arc<ModelRegistry>) -> RowStore {
        RowStore::new(self.conn.clone(), registry)
    }

    /// Row store over the marketplace entities.
    pub fn catalog_rows(&self) -> MotorlotResult<RowStore> {
        Ok(self.rows(Arc::new(models::registry()?)))
    }

    /// Seed loader over the marketplace entity tables.
    pub fn seeds(&self) -> MotorlotResult<SeedLoader> {
        Ok(
            SeedLoader::new(self.conn.clone(), Arc::new(models::registry()?))
                .with_failpoints(self.failpoints.clone()),
        )
    }
}

fn build_connection_url(config: &MotorlotConfig, base_dir: &Path) -> MotorlotResult<String> {
    match &config.database {
        DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        DatabaseConfig::Postgres { url } => Ok(url.clone()),
        DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}
