//! Row access for registered entities with the soft-delete lifecycle applied.
//!
//! Reads on paranoid entities hide soft-deleted rows unless [`ReadScope::IncludeDeleted`]
//! is requested. Deletes walk the registry's cascade edges breadth-first inside a single
//! transaction; every `(entity, id)` pair is transitioned at most once.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::prelude::Decimal;
use sea_orm::sea_query::{Alias, Expr, Order, Query, SelectStatement, SimpleExpr, Value};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, QueryResult, Statement,
    TransactionTrait,
};

use crate::db::{build_stmt, exec, query_all, query_one};
use motorlot_core::schema::{CREATED_AT, DELETED_AT, ID_COLUMN, UPDATED_AT};
use motorlot_core::{
    ColumnType, DeleteAction, EntityDef, ModelRegistry, MotorlotError, MotorlotResult, Paging,
    ReadScope, RowState, TableSpec, Timestamp, delete_action, paging,
};

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Time(NaiveTime),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    fn into_value(self, column_type: ColumnType) -> Value {
        match self {
            FieldValue::Null => null_value(column_type),
            FieldValue::Int(value) => value.into(),
            FieldValue::Decimal(value) => value.into(),
            FieldValue::Text(value) => value.into(),
            FieldValue::Bool(value) => value.into(),
            FieldValue::Timestamp(value) => value.into(),
            FieldValue::Time(value) => value.into(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(value: NaiveTime) -> Self {
        FieldValue::Time(value)
    }
}

fn null_value(column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Integer | ColumnType::BigInteger => Value::BigInt(None),
        ColumnType::Decimal { .. } => Value::Decimal(None),
        ColumnType::String { .. } | ColumnType::Text => Value::String(None),
        ColumnType::Boolean => Value::Bool(None),
        ColumnType::Timestamp => Value::ChronoDateTimeUtc(None),
        ColumnType::Time => Value::ChronoTime(None),
    }
}

pub type Values = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub id: i64,
    pub values: Values,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self.values.get(DELETED_AT) {
            Some(FieldValue::Timestamp(at)) => Some(*at),
            _ => None,
        }
    }

    pub fn state(&self) -> RowState {
        RowState::from_deleted_at(self.deleted_at().map(Timestamp::from_datetime))
    }
}

/// Rows transitioned by one delete call, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub soft_deleted: Vec<(String, i64)>,
    pub removed: Vec<(String, i64)>,
}

#[derive(Clone, Debug)]
pub struct RowStore {
    conn: DatabaseConnection,
    registry: Arc<ModelRegistry>,
}

impl RowStore {
    pub fn new(conn: DatabaseConnection, registry: Arc<ModelRegistry>) -> Self {
        Self { conn, registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    fn resolve(&self, entity: &str) -> MotorlotResult<(&EntityDef, TableSpec)> {
        let def = self.registry.entity(entity)?;
        Ok((def, self.registry.table_spec(def)))
    }

    /// Inserts a row and returns its id. Timestamps are filled in when the entity has them.
    pub async fn insert(&self, entity: &str, values: Values) -> MotorlotResult<i64> {
        let (def, table) = self.resolve(entity)?;
        let mut values = values;
        if def.timestamps {
            let now = Timestamp::now().to_datetime();
            values
                .entry(CREATED_AT.to_string())
                .or_insert(FieldValue::Timestamp(now));
            values
                .entry(UPDATED_AT.to_string())
                .or_insert(FieldValue::Timestamp(now));
        }
        let (columns, exprs) = bind_values(&table, values)?;
        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(&table.name))
            .columns(columns)
            .values(exprs)
            .map_err(|err| MotorlotError::invalid(err.to_string()))?;
        let backend = self.conn.get_database_backend();
        let id = if backend == DatabaseBackend::MySql {
            let (sql, params) = build_stmt(backend, &insert);
            self.conn
                .execute(Statement::from_sql_and_values(backend, sql, params))
                .await?
                .last_insert_id() as i64
        } else {
            insert.returning_col(Alias::new(ID_COLUMN));
            let row = query_one(&self.conn, &insert)
                .await?
                .ok_or_else(|| MotorlotError::storage("insert returned no id"))?;
            row.try_get::<i64>("", ID_COLUMN)?
        };
        log::debug!("inserted {entity} {id}");
        Ok(id)
    }

    /// Updates a visible row. Soft-deleted rows are reported as missing.
    pub async fn update(&self, entity: &str, id: i64, values: Values) -> MotorlotResult<()> {
        let (def, table) = self.resolve(entity)?;
        let mut values = values;
        if values.contains_key(ID_COLUMN) || values.contains_key(DELETED_AT) {
            return Err(MotorlotError::invalid(
                "id and deletedAt are managed by the row store",
            ));
        }
        if values.is_empty() {
            return Err(MotorlotError::invalid("update carries no values"));
        }
        if def.timestamps {
            values.insert(
                UPDATED_AT.to_string(),
                FieldValue::Timestamp(Timestamp::now().to_datetime()),
            );
        }
        let (columns, exprs) = bind_values(&table, values)?;
        let mut update = Query::update();
        update
            .table(Alias::new(&table.name))
            .values(columns.into_iter().zip(exprs))
            .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id));
        if def.paranoid {
            update.and_where(Expr::col(Alias::new(DELETED_AT)).is_null());
        }
        if exec(&self.conn, &update).await? == 0 {
            let state = stored_state(&self.conn, def, id)
                .await?
                .ok_or_else(|| missing(entity, id))?;
            state
                .check_writable()
                .map_err(|err| about_row(err, entity, id))?;
            return Err(missing(entity, id));
        }
        Ok(())
    }

    pub async fn find(
        &self,
        entity: &str,
        id: i64,
        scope: ReadScope,
    ) -> MotorlotResult<Option<Row>> {
        let (def, table) = self.resolve(entity)?;
        let mut select = select_rows(def, &table, ReadScope::IncludeDeleted);
        select.and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id));
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        let row = read_row(&table, &row)?;
        Ok(row.state().visible(scope).then_some(row))
    }

    pub async fn list(&self, entity: &str, scope: ReadScope) -> MotorlotResult<Vec<Row>> {
        let (def, table) = self.resolve(entity)?;
        let select = select_rows(def, &table, scope);
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(|row| read_row(&table, row)).collect()
    }

    pub async fn count(&self, entity: &str, scope: ReadScope) -> MotorlotResult<u64> {
        let (def, table) = self.resolve(entity)?;
        let mut select = Query::select();
        select
            .expr_as(Expr::col(Alias::new(ID_COLUMN)).count(), Alias::new("total"))
            .from(Alias::new(&table.name));
        if def.paranoid && !scope.includes_deleted() {
            select.and_where(Expr::col(Alias::new(DELETED_AT)).is_null());
        }
        let total: i64 = match query_one(&self.conn, &select).await? {
            Some(row) => row.try_get("", "total")?,
            None => 0,
        };
        Ok(total.max(0) as u64)
    }

    /// One page of rows ordered by id, with its paging metadata.
    pub async fn find_page(
        &self,
        entity: &str,
        page: u64,
        limit: u64,
        scope: ReadScope,
    ) -> MotorlotResult<(Vec<Row>, Paging)> {
        let count = self.count(entity, scope).await?;
        let paging = paging(page, count, limit);
        if paging.is_past_end() {
            return Ok((Vec::new(), paging));
        }
        let (def, table) = self.resolve(entity)?;
        let mut select = select_rows(def, &table, scope);
        select
            .limit(paging.record_per_page)
            .offset(paging.offset());
        let rows = query_all(&self.conn, &select).await?;
        let rows = rows
            .iter()
            .map(|row| read_row(&table, row))
            .collect::<MotorlotResult<Vec<_>>>()?;
        Ok((rows, paging))
    }

    /// Deletes a row and everything its cascade edges reach. Paranoid rows are soft-deleted,
    /// other rows are removed after their dependents.
    pub async fn delete(&self, entity: &str, id: i64) -> MotorlotResult<DeleteReport> {
        let (root, _) = self.resolve(entity)?;
        let now = Timestamp::now().to_datetime();
        let txn = self.conn.begin().await?;
        let mut report = DeleteReport::default();
        let mut removals: Vec<(String, i64)> = Vec::new();

        match delete_action(root.paranoid) {
            DeleteAction::SoftDelete => {
                if !soft_delete_row(&txn, &root.table, id, now).await? {
                    let state = stored_state(&txn, root, id)
                        .await?
                        .ok_or_else(|| missing(entity, id))?;
                    state
                        .soft_delete(Timestamp::from_datetime(now))
                        .map_err(|err| about_row(err, entity, id))?;
                    return Err(MotorlotError::conflict(format!(
                        "{entity} {id} changed during delete"
                    )));
                }
                report.soft_deleted.push((root.name.clone(), id));
            }
            DeleteAction::Remove => {
                if stored_state(&txn, root, id).await?.is_none() {
                    return Err(missing(entity, id));
                }
                removals.push((root.name.clone(), id));
            }
        }

        let mut visited: HashSet<(String, i64)> = HashSet::from([(root.name.clone(), id)]);
        let mut queue: VecDeque<(String, i64)> = VecDeque::from([(root.name.clone(), id)]);
        while let Some((current, current_id)) = queue.pop_front() {
            for edge in self.registry.cascade_edges(&current) {
                let dependent = self.registry.entity(&edge.dependent)?;
                let ids = dependent_ids(&txn, dependent, &edge.foreign_key, current_id).await?;
                for dependent_id in ids {
                    let key = (dependent.name.clone(), dependent_id);
                    if !visited.insert(key.clone()) {
                        continue;
                    }
                    log::debug!(
                        "cascade {current} {current_id} -> {} {dependent_id}",
                        dependent.name
                    );
                    match delete_action(dependent.paranoid) {
                        DeleteAction::SoftDelete => {
                            if soft_delete_row(&txn, &dependent.table, dependent_id, now).await? {
                                report.soft_deleted.push(key.clone());
                            }
                        }
                        DeleteAction::Remove => removals.push(key.clone()),
                    }
                    queue.push_back(key);
                }
            }
        }

        for (name, row_id) in removals.iter().rev() {
            let def = self.registry.entity(name)?;
            let delete = Query::delete()
                .from_table(Alias::new(&def.table))
                .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(*row_id))
                .to_owned();
            exec(&txn, &delete).await?;
        }
        report.removed = removals;
        txn.commit().await?;
        log::info!(
            "deleted {entity} {id}: {} soft-deleted, {} removed",
            report.soft_deleted.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// Clears `deletedAt` on exactly one row. Dependents stay deleted.
    pub async fn restore(&self, entity: &str, id: i64) -> MotorlotResult<()> {
        let (def, _) = self.resolve(entity)?;
        if !def.paranoid {
            return Err(MotorlotError::invalid(format!(
                "{entity} is not paranoid and cannot be restored"
            )));
        }
        let update = Query::update()
            .table(Alias::new(&def.table))
            .value(Alias::new(DELETED_AT), Value::ChronoDateTimeUtc(None))
            .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id))
            .and_where(Expr::col(Alias::new(DELETED_AT)).is_not_null())
            .to_owned();
        if exec(&self.conn, &update).await? == 0 {
            let state = stored_state(&self.conn, def, id)
                .await?
                .ok_or_else(|| missing(entity, id))?;
            state.restore().map_err(|err| about_row(err, entity, id))?;
            return Err(MotorlotError::conflict(format!(
                "{entity} {id} changed during restore"
            )));
        }
        log::info!("restored {entity} {id}");
        Ok(())
    }
}

/// Checks values against the table and binds each with its column's type.
pub(crate) fn bind_values(
    table: &TableSpec,
    values: Values,
) -> MotorlotResult<(Vec<Alias>, Vec<SimpleExpr>)> {
    let mut columns = Vec::with_capacity(values.len());
    let mut exprs = Vec::with_capacity(values.len());
    for (name, value) in values {
        let column = table.find_column(&name).ok_or_else(|| {
            MotorlotError::invalid(format!("{} has no column '{name}'", table.name))
        })?;
        if column.auto_increment {
            return Err(MotorlotError::invalid(format!(
                "{}.{name} is generated by the database",
                table.name
            )));
        }
        if value.is_null() && !column.nullable {
            return Err(MotorlotError::invalid(format!(
                "{}.{name} cannot be null",
                table.name
            )));
        }
        columns.push(Alias::new(name));
        exprs.push(value.into_value(column.column_type).into());
    }
    Ok((columns, exprs))
}

fn select_rows(def: &EntityDef, table: &TableSpec, scope: ReadScope) -> SelectStatement {
    let mut select = Query::select();
    select
        .columns(table.columns.iter().map(|column| Alias::new(&column.name)))
        .from(Alias::new(&table.name))
        .order_by(Alias::new(ID_COLUMN), Order::Asc);
    if def.paranoid && !scope.includes_deleted() {
        select.and_where(Expr::col(Alias::new(DELETED_AT)).is_null());
    }
    select
}

fn read_row(table: &TableSpec, row: &QueryResult) -> MotorlotResult<Row> {
    let mut values = BTreeMap::new();
    let mut id = None;
    for column in &table.columns {
        let name = column.name.as_str();
        let value = match column.column_type {
            ColumnType::Integer | ColumnType::BigInteger => row
                .try_get::<Option<i64>>("", name)?
                .map(FieldValue::Int),
            ColumnType::Decimal { .. } => row
                .try_get::<Option<Decimal>>("", name)?
                .map(FieldValue::Decimal),
            ColumnType::String { .. } | ColumnType::Text => row
                .try_get::<Option<String>>("", name)?
                .map(FieldValue::Text),
            ColumnType::Boolean => row.try_get::<Option<bool>>("", name)?.map(FieldValue::Bool),
            ColumnType::Timestamp => row
                .try_get::<Option<DateTime<Utc>>>("", name)?
                .map(FieldValue::Timestamp),
            ColumnType::Time => row
                .try_get::<Option<NaiveTime>>("", name)?
                .map(FieldValue::Time),
        }
        .unwrap_or(FieldValue::Null);
        if name == ID_COLUMN {
            id = value.as_int();
        }
        values.insert(column.name.clone(), value);
    }
    let id = id.ok_or_else(|| MotorlotError::storage(format!("{} row without id", table.name)))?;
    Ok(Row { id, values })
}

/// Conditional soft delete. False when the row is missing or already deleted.
async fn soft_delete_row<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    id: i64,
    now: DateTime<Utc>,
) -> MotorlotResult<bool> {
    let update = Query::update()
        .table(Alias::new(table))
        .value(Alias::new(DELETED_AT), now)
        .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id))
        .and_where(Expr::col(Alias::new(DELETED_AT)).is_null())
        .to_owned();
    Ok(exec(conn, &update).await? > 0)
}

/// Lifecycle state of a stored row, whatever its visibility. `None` when no row has the id.
async fn stored_state<C: ConnectionTrait>(
    conn: &C,
    def: &EntityDef,
    id: i64,
) -> MotorlotResult<Option<RowState>> {
    let mut select = Query::select();
    select
        .column(Alias::new(ID_COLUMN))
        .from(Alias::new(&def.table))
        .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(id));
    if def.paranoid {
        select.column(Alias::new(DELETED_AT));
    }
    let Some(row) = query_one(conn, &select).await? else {
        return Ok(None);
    };
    let deleted_at = if def.paranoid {
        row.try_get::<Option<DateTime<Utc>>>("", DELETED_AT)?
            .map(Timestamp::from_datetime)
    } else {
        None
    };
    Ok(Some(RowState::from_deleted_at(deleted_at)))
}

fn missing(entity: &str, id: i64) -> MotorlotError {
    MotorlotError::not_found(format!("{entity} {id}"))
}

/// Names the row in a lifecycle error.
fn about_row(err: MotorlotError, entity: &str, id: i64) -> MotorlotError {
    match err {
        MotorlotError::NotFound { message } => {
            MotorlotError::not_found(format!("{entity} {id}: {message}"))
        }
        MotorlotError::Conflict { message } => {
            MotorlotError::conflict(format!("{entity} {id}: {message}"))
        }
        other => other,
    }
}

/// Live dependents of one parent row. Already soft-deleted dependents are skipped.
async fn dependent_ids<C: ConnectionTrait>(
    conn: &C,
    dependent: &EntityDef,
    foreign_key: &str,
    parent_id: i64,
) -> MotorlotResult<Vec<i64>> {
    let mut select = Query::select();
    select
        .column(Alias::new(ID_COLUMN))
        .from(Alias::new(&dependent.table))
        .and_where(Expr::col(Alias::new(foreign_key)).eq(parent_id))
        .order_by(Alias::new(ID_COLUMN), Order::Asc);
    if dependent.paranoid {
        select.and_where(Expr::col(Alias::new(DELETED_AT)).is_null());
    }
    let rows = query_all(conn, &select).await?;
    rows.iter()
        .map(|row| row.try_get::<i64>("", ID_COLUMN).map_err(MotorlotError::from))
        .collect()
}
