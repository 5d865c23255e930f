use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::sea_query::{Alias, ColumnDef, Expr, Index, Query, SimpleExpr, Table, Value};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::db::{MotorlotSeedRows, col_name, exec, exec_schema, query_all, query_one};
use crate::rows::{FieldValue, Values, bind_values};
use motorlot_core::schema::{CREATED_AT, ID_COLUMN, UPDATED_AT};
use motorlot_core::{EntityDef, ModelRegistry, MotorlotError, MotorlotResult, TableSpec, Timestamp};

#[derive(Clone, Debug, PartialEq)]
pub struct SeedRow {
    pub id: i64,
    pub values: Values,
}

impl SeedRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            values: Values::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }
}

/// Fixed reference rows for one entity table, inserted with caller-chosen ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Seed {
    pub name: String,
    pub table: String,
    pub rows: Vec<SeedRow>,
}

impl Seed {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: SeedRow) -> Self {
        self.rows.push(row);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedConflict {
    /// Leave existing rows untouched.
    #[default]
    Skip,
    /// Abort the whole seed with `DuplicateSeedRow`.
    Fail,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: Vec<i64>,
    pub skipped: Vec<i64>,
}

/// Loads seeds into tables of registered entities. Values bind with the entity's column types.
#[derive(Clone, Debug)]
pub struct SeedLoader {
    conn: DatabaseConnection,
    registry: Arc<ModelRegistry>,
    failpoints: HashSet<String>,
}

impl SeedLoader {
    pub fn new(conn: DatabaseConnection, registry: Arc<ModelRegistry>) -> Self {
        Self {
            conn,
            registry,
            failpoints: HashSet::new(),
        }
    }

    pub fn with_failpoints(mut self, failpoints: HashSet<String>) -> Self {
        self.failpoints = failpoints;
        self
    }

    fn maybe_failpoint(&self, key: &str) -> MotorlotResult<()> {
        if self.failpoints.contains(key) {
            Err(MotorlotError::storage(format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }

    fn target(&self, seed: &Seed) -> MotorlotResult<(&EntityDef, TableSpec)> {
        let def = self.registry.by_table(&seed.table).ok_or_else(|| {
            MotorlotError::invalid(format!(
                "seed {}: no registered entity is stored in {}",
                seed.name, seed.table
            ))
        })?;
        Ok((def, self.registry.table_spec(def)))
    }

    /// Inserts every row not already present, in one transaction.
    pub async fn load_seed(&self, seed: &Seed, mode: SeedConflict) -> MotorlotResult<SeedReport> {
        let (def, table) = self.target(seed)?;
        ensure_table(&self.conn).await?;
        let txn = self.conn.begin().await?;
        let mut report = SeedReport::default();
        let now = Timestamp::now().to_datetime();
        for row in &seed.rows {
            if row_exists(&txn, &seed.table, row.id).await? {
                match mode {
                    SeedConflict::Skip => {
                        log::warn!(
                            "seed {}: {} row {} already exists, skipping",
                            seed.name,
                            seed.table,
                            row.id
                        );
                        report.skipped.push(row.id);
                        continue;
                    }
                    SeedConflict::Fail => {
                        return Err(MotorlotError::DuplicateSeedRow {
                            seed: seed.name.clone(),
                            table: seed.table.clone(),
                            id: row.id,
                        });
                    }
                }
            }
            let mut values = row.values.clone();
            values.remove(ID_COLUMN);
            if def.timestamps {
                values
                    .entry(CREATED_AT.to_string())
                    .or_insert(FieldValue::Timestamp(now));
                values
                    .entry(UPDATED_AT.to_string())
                    .or_insert(FieldValue::Timestamp(now));
            }
            insert_row(&txn, &table, row.id, values).await?;
            record_row(&txn, seed, row.id).await?;
            report.inserted.push(row.id);
        }
        if !report.inserted.is_empty() {
            if let Some(sql) = sequence_reset_sql(txn.get_database_backend(), &seed.table) {
                txn.query_one(Statement::from_string(DatabaseBackend::Postgres, sql))
                    .await?;
            }
        }
        self.maybe_failpoint(&format!("seed:{}", seed.name))?;
        txn.commit().await?;
        log::info!(
            "seed {}: {} inserted, {} skipped",
            seed.name,
            report.inserted.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Deletes the rows this seed inserted that it still lists, and forgets only those.
    /// Returns the removed ids.
    pub async fn remove_seed(&self, seed: &Seed) -> MotorlotResult<Vec<i64>> {
        ensure_table(&self.conn).await?;
        let txn = self.conn.begin().await?;
        let listed: HashSet<i64> = seed.rows.iter().map(|row| row.id).collect();
        let recorded = recorded_ids(&txn, seed).await?;
        let ids: Vec<i64> = recorded
            .into_iter()
            .filter(|id| listed.contains(id))
            .collect();
        if !ids.is_empty() {
            let delete = Query::delete()
                .from_table(Alias::new(&seed.table))
                .and_where(Expr::col(Alias::new(ID_COLUMN)).is_in(ids.iter().copied()))
                .to_owned();
            exec(&txn, &delete).await?;
            let forget = Query::delete()
                .from_table(MotorlotSeedRows::Table)
                .and_where(Expr::col(MotorlotSeedRows::SeedName).eq(seed.name.as_str()))
                .and_where(Expr::col(MotorlotSeedRows::TableName).eq(seed.table.as_str()))
                .and_where(Expr::col(MotorlotSeedRows::RowId).is_in(ids.iter().copied()))
                .to_owned();
            exec(&txn, &forget).await?;
        }
        txn.commit().await?;
        log::info!("seed {}: removed {} rows", seed.name, ids.len());
        Ok(ids)
    }

    /// Ids recorded as inserted by this seed.
    pub async fn recorded(&self, seed: &Seed) -> MotorlotResult<Vec<i64>> {
        ensure_table(&self.conn).await?;
        recorded_ids(&self.conn, seed).await
    }
}

pub async fn ensure_table<C: ConnectionTrait>(conn: &C) -> MotorlotResult<()> {
    exec_schema(
        conn,
        &Table::create()
            .table(MotorlotSeedRows::Table)
            .if_not_exists()
            .col(ColumnDef::new(MotorlotSeedRows::SeedName).string().not_null())
            .col(ColumnDef::new(MotorlotSeedRows::TableName).string().not_null())
            .col(ColumnDef::new(MotorlotSeedRows::RowId).big_integer().not_null())
            .col(
                ColumnDef::new(MotorlotSeedRows::InsertedAt)
                    .big_integer()
                    .not_null(),
            )
            .primary_key(
                Index::create()
                    .name("pk_motorlot_seed_rows")
                    .col(MotorlotSeedRows::SeedName)
                    .col(MotorlotSeedRows::TableName)
                    .col(MotorlotSeedRows::RowId),
            )
            .to_owned(),
    )
    .await
}

async fn row_exists<C: ConnectionTrait>(conn: &C, table: &str, id: i64) -> MotorlotResult<bool> {
    let select = Query::select()
        .column(Alias::new(ID_COLUMN))
        .from(Alias::new(table))
        .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id))
        .to_owned();
    Ok(query_one(conn, &select).await?.is_some())
}

async fn insert_row<C: ConnectionTrait>(
    conn: &C,
    table: &TableSpec,
    id: i64,
    values: Values,
) -> MotorlotResult<()> {
    let (bound_columns, bound_exprs) = bind_values(table, values)?;
    let mut columns = vec![Alias::new(ID_COLUMN)];
    columns.extend(bound_columns);
    let mut exprs: Vec<SimpleExpr> = vec![Value::from(id).into()];
    exprs.extend(bound_exprs);
    let insert = Query::insert()
        .into_table(Alias::new(&table.name))
        .columns(columns)
        .values(exprs)
        .map_err(|err| MotorlotError::invalid(err.to_string()))?
        .to_owned();
    exec(conn, &insert).await?;
    Ok(())
}

async fn record_row<C: ConnectionTrait>(conn: &C, seed: &Seed, id: i64) -> MotorlotResult<()> {
    let insert = Query::insert()
        .into_table(MotorlotSeedRows::Table)
        .columns([
            MotorlotSeedRows::SeedName,
            MotorlotSeedRows::TableName,
            MotorlotSeedRows::RowId,
            MotorlotSeedRows::InsertedAt,
        ])
        .values_panic([
            seed.name.as_str().into(),
            seed.table.as_str().into(),
            id.into(),
            Timestamp::now().as_micros().into(),
        ])
        .to_owned();
    exec(conn, &insert).await?;
    Ok(())
}

async fn recorded_ids<C: ConnectionTrait>(conn: &C, seed: &Seed) -> MotorlotResult<Vec<i64>> {
    let select = Query::select()
        .column(MotorlotSeedRows::RowId)
        .from(MotorlotSeedRows::Table)
        .and_where(Expr::col(MotorlotSeedRows::SeedName).eq(seed.name.as_str()))
        .and_where(Expr::col(MotorlotSeedRows::TableName).eq(seed.table.as_str()))
        .to_owned();
    let rows = query_all(conn, &select).await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row.try_get("", &col_name(MotorlotSeedRows::RowId))?;
        ids.push(id);
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Statement moving a Postgres serial sequence past explicitly inserted ids.
fn sequence_reset_sql(backend: DatabaseBackend, table: &str) -> Option<String> {
    if backend != DatabaseBackend::Postgres {
        return None;
    }
    let quoted = format!("\"{}\"", table.replace('"', "\"\""));
    Some(format!(
        "SELECT setval(pg_get_serial_sequence('{}', '{ID_COLUMN}'), \
         (SELECT MAX(\"{ID_COLUMN}\") FROM {quoted}))",
        quoted.replace('\'', "''")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_sequences_follow_seeded_ids() {
        let sql = sequence_reset_sql(DatabaseBackend::Postgres, "Types").expect("postgres");
        assert_eq!(
            sql,
            "SELECT setval(pg_get_serial_sequence('\"Types\"', 'id'), \
             (SELECT MAX(\"id\") FROM \"Types\"))"
        );
        assert!(sequence_reset_sql(DatabaseBackend::Sqlite, "Types").is_none());
        assert!(sequence_reset_sql(DatabaseBackend::MySql, "Types").is_none());
    }
}
