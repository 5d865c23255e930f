use std::collections::HashSet;

use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use sea_orm_migration::SchemaManager;

use crate::{ddl, ledger, lock};
use motorlot_core::plan::{self, LedgerEntry, UnitStatus};
use motorlot_core::{
    MigrationUnit, MotorlotError, MotorlotResult, SchemaShape, Timestamp, Version,
};

/// Applies and rolls back migration units against one database, one transaction per unit.
#[derive(Clone, Debug)]
pub struct MigrationRunner {
    conn: DatabaseConnection,
    units: Vec<MigrationUnit>,
    holder: String,
    failpoints: HashSet<String>,
}

impl MigrationRunner {
    /// Validates the unit set before touching the database.
    pub fn new(conn: DatabaseConnection, units: Vec<MigrationUnit>) -> MotorlotResult<Self> {
        plan::validate_units(&units)?;
        Ok(Self {
            conn,
            units,
            holder: lock::default_holder(),
            failpoints: HashSet::new(),
        })
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    pub fn with_failpoints(mut self, failpoints: HashSet<String>) -> Self {
        self.failpoints = failpoints;
        self
    }

    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    fn maybe_failpoint(&self, key: &str) -> MotorlotResult<()> {
        if self.failpoints.contains(key) {
            Err(MotorlotError::storage(format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }

    pub async fn ledger(&self) -> MotorlotResult<Vec<LedgerEntry>> {
        ledger::ensure_table(&self.conn).await?;
        ledger::load(&self.conn).await
    }

    pub async fn pending(&self) -> MotorlotResult<Vec<&MigrationUnit>> {
        let entries = self.ledger().await?;
        plan::pending(&entries, &self.units)
    }

    pub async fn status(&self) -> MotorlotResult<Vec<UnitStatus>> {
        let entries = self.ledger().await?;
        plan::check_ledger_known(&entries, &self.units)?;
        Ok(plan::status(&entries, &self.units))
    }

    /// Structural shape implied by the applied units, in application order.
    pub async fn applied_shape(&self) -> MotorlotResult<SchemaShape> {
        let entries = self.ledger().await?;
        plan::check_ledger_known(&entries, &self.units)?;
        let mut shape = SchemaShape::new();
        for entry in &entries {
            if let Some(unit) = self.unit(&entry.version) {
                shape.apply_unit(unit)?;
            }
        }
        Ok(shape)
    }

    fn unit(&self, version: &Version) -> Option<&MigrationUnit> {
        self.units.iter().find(|unit| &unit.version == version)
    }

    /// Applies pending units in ascending order, up to `to` inclusive when given.
    /// Returns the versions applied by this call.
    pub async fn apply_forward(&self, to: Option<&Version>) -> MotorlotResult<Vec<Version>> {
        let held = lock::acquire(&self.conn, &self.holder).await?;
        let result = self.apply_forward_locked(to).await;
        let released = held.release(&self.conn).await;
        let applied = result?;
        released?;
        Ok(applied)
    }

    async fn apply_forward_locked(&self, to: Option<&Version>) -> MotorlotResult<Vec<Version>> {
        let entries = self.ledger().await?;
        let pending = plan::pending_until(&entries, &self.units, to)?;
        if pending.is_empty() {
            log::info!("schema is up to date");
            return Ok(Vec::new());
        }
        if self.conn.get_database_backend() == DatabaseBackend::MySql {
            log::warn!(
                "mysql does not roll back DDL; a failed migration may leave partial changes"
            );
        }
        let mut applied = Vec::with_capacity(pending.len());
        for unit in pending {
            self.apply_unit(unit).await?;
            log::info!("applied migration {} ({})", unit.version, unit.description);
            applied.push(unit.version.clone());
        }
        Ok(applied)
    }

    async fn apply_unit(&self, unit: &MigrationUnit) -> MotorlotResult<()> {
        let txn = self
            .conn
            .begin()
            .await
            .map_err(|err| unit_failure(unit, "begin", err.to_string()))?;
        let outcome = self.apply_unit_in(&txn, unit).await;
        finish(txn, outcome, |message| unit_failure(unit, "commit", message)).await
    }

    async fn apply_unit_in(
        &self,
        txn: &DatabaseTransaction,
        unit: &MigrationUnit,
    ) -> MotorlotResult<()> {
        let manager = SchemaManager::new(txn);
        for change in &unit.changes {
            log::debug!(
                "migration {}: {} on {}",
                unit.version,
                change.operation(),
                change.table()
            );
            ddl::apply_change(&manager, change).await.map_err(|err| {
                MotorlotError::migration_failed(
                    unit.version.as_str(),
                    change.table(),
                    change.operation(),
                    failure_message(err),
                )
            })?;
        }
        let record = async {
            self.maybe_failpoint(&format!("migrate:{}", unit.version))?;
            ledger::record(txn, unit, Timestamp::now()).await
        };
        record
            .await
            .map_err(|err| unit_failure(unit, "record", failure_message(err)))
    }

    /// Reverts the `steps` most recently applied units, newest first.
    pub async fn rollback_last(&self, steps: usize) -> MotorlotResult<Vec<Version>> {
        let held = lock::acquire(&self.conn, &self.holder).await?;
        let result = self.rollback_locked(steps).await;
        let released = held.release(&self.conn).await;
        let rolled_back = result?;
        released?;
        Ok(rolled_back)
    }

    async fn rollback_locked(&self, steps: usize) -> MotorlotResult<Vec<Version>> {
        let entries = self.ledger().await?;
        plan::check_ledger_known(&entries, &self.units)?;
        let targets: Vec<Version> = plan::rollback_order(&entries, steps)
            .into_iter()
            .map(|entry| entry.version.clone())
            .collect();
        let mut rolled_back = Vec::with_capacity(targets.len());
        for version in targets {
            let Some(unit) = self.unit(&version) else {
                return Err(MotorlotError::unknown_version(version.as_str()));
            };
            if let Err(err) = self.rollback_unit(unit).await {
                let still_applied = self.still_applied().await?;
                return Err(MotorlotError::rollback_failed(
                    version.as_str(),
                    failure_message(err),
                    still_applied,
                ));
            }
            log::info!("rolled back migration {} ({})", unit.version, unit.description);
            rolled_back.push(version);
        }
        Ok(rolled_back)
    }

    async fn rollback_unit(&self, unit: &MigrationUnit) -> MotorlotResult<()> {
        let Some(inverse) = unit.inverse_changes() else {
            return Err(MotorlotError::invalid(
                "unit contains raw SQL without a down statement",
            ));
        };
        let txn = self.conn.begin().await?;
        let outcome = async {
            let manager = SchemaManager::new(&txn);
            for change in &inverse {
                log::debug!(
                    "rollback {}: {} on {}",
                    unit.version,
                    change.operation(),
                    change.table()
                );
                ddl::apply_change(&manager, change).await?;
            }
            self.maybe_failpoint(&format!("rollback:{}", unit.version))?;
            ledger::remove(&txn, &unit.version).await?;
            Ok(())
        }
        .await;
        finish(txn, outcome, MotorlotError::storage).await
    }

    async fn still_applied(&self) -> MotorlotResult<Vec<String>> {
        let mut versions: Vec<String> = ledger::load(&self.conn)
            .await?
            .into_iter()
            .map(|entry| entry.version.as_str().to_string())
            .collect();
        versions.sort();
        Ok(versions)
    }

    pub async fn force_unlock(&self) -> MotorlotResult<bool> {
        lock::force_unlock(&self.conn).await
    }
}

/// Commits on success, rolls back otherwise.
async fn finish(
    txn: DatabaseTransaction,
    outcome: MotorlotResult<()>,
    commit_error: impl FnOnce(String) -> MotorlotError,
) -> MotorlotResult<()> {
    match outcome {
        Ok(()) => txn
            .commit()
            .await
            .map_err(|err| commit_error(err.to_string())),
        Err(err) => {
            if let Err(rollback) = txn.rollback().await {
                log::warn!("transaction rollback failed: {rollback}");
            }
            Err(err)
        }
    }
}

/// Forward failure of a whole unit outside any single change.
fn unit_failure(unit: &MigrationUnit, operation: &str, message: String) -> MotorlotError {
    MotorlotError::migration_failed(unit.version.as_str(), unit.table(), operation, message)
}

/// Inner message without the variant prefix added by `Display`.
fn failure_message(err: MotorlotError) -> String {
    match err {
        MotorlotError::Storage { message }
        | MotorlotError::Validation { message }
        | MotorlotError::NotFound { message }
        | MotorlotError::Conflict { message } => message,
        other => other.to_string(),
    }
}
