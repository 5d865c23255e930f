use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotorlotError {
    #[error("duplicate migration version '{version}'")]
    DuplicateVersion { version: String },
    #[error("duplicate entity '{name}'")]
    DuplicateEntity { name: String },
    #[error("dangling association reference: {}", .unresolved.join("; "))]
    DanglingReference { unresolved: Vec<String> },
    #[error("ledger references unknown migration version '{version}'")]
    UnknownVersion { version: String },
    #[error("migration {version} failed ({operation} on {table}): {message}")]
    MigrationFailed {
        version: String,
        table: String,
        operation: String,
        message: String,
    },
    #[error("rollback of {version} failed: {message} (still applied: [{}])", .still_applied.join(", "))]
    RollbackFailed {
        version: String,
        message: String,
        still_applied: Vec<String>,
    },
    #[error("seed '{seed}' row {id} already exists in {table}")]
    DuplicateSeedRow { seed: String, table: String, id: i64 },
    #[error("migration lock is held by {holder}")]
    ConcurrentMigration { holder: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl MotorlotError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn duplicate_version(version: impl Into<String>) -> Self {
        Self::DuplicateVersion {
            version: version.into(),
        }
    }

    pub fn duplicate_entity(name: impl Into<String>) -> Self {
        Self::DuplicateEntity { name: name.into() }
    }

    pub fn unknown_version(version: impl Into<String>) -> Self {
        Self::UnknownVersion {
            version: version.into(),
        }
    }

    pub fn migration_failed(
        version: impl Into<String>,
        table: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MigrationFailed {
            version: version.into(),
            table: table.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn rollback_failed(
        version: impl Into<String>,
        message: impl Into<String>,
        still_applied: Vec<String>,
    ) -> Self {
        Self::RollbackFailed {
            version: version.into(),
            message: message.into(),
            still_applied,
        }
    }

    pub fn concurrent_migration(holder: impl Into<String>) -> Self {
        Self::ConcurrentMigration {
            holder: holder.into(),
        }
    }

    /// True for errors raised while validating declarations, before any storage access.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateVersion { .. }
                | Self::DuplicateEntity { .. }
                | Self::DanglingReference { .. }
                | Self::Validation { .. }
        )
    }
}

pub type MotorlotResult<T> = Result<T, MotorlotError>;

impl From<sea_orm::DbErr> for MotorlotError {
    fn from(value: sea_orm::DbErr) -> Self {
        MotorlotError::storage(value.to_string())
    }
}
