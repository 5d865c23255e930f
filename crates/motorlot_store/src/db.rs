use sea_orm::sea_query;
use sea_orm::sea_query::{
    MysqlQueryBuilder, PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement, StatementBuilder};
use sea_orm::DeriveIden;

use motorlot_core::MotorlotResult;

#[derive(DeriveIden, Clone, Copy)]
pub enum MotorlotSchemaMigrations {
    Table,
    Version,
    Description,
    AppliedAt,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum MotorlotMigrationLock {
    Table,
    Id,
    Holder,
    AcquiredAt,
}

#[derive(DeriveIden, Clone, Copy)]
pub enum MotorlotSeedRows {
    Table,
    SeedName,
    TableName,
    RowId,
    InsertedAt,
}

pub fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

pub fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
    }
}

pub async fn exec<C, S>(conn: &C, stmt: &S) -> MotorlotResult<u64>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result.rows_affected())
}

pub async fn query_all<C, S>(conn: &C, stmt: &S) -> MotorlotResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

pub async fn query_one<C, S>(conn: &C, stmt: &S) -> MotorlotResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

/// Runs a schema statement (create/drop table, index) outside a `SchemaManager`.
pub async fn exec_schema<C, S>(conn: &C, stmt: &S) -> MotorlotResult<()>
where
    C: ConnectionTrait,
    S: StatementBuilder,
{
    let backend = conn.get_database_backend();
    conn.execute(backend.build(stmt)).await?;
    Ok(())
}
