use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{ColumnDef, Expr, Order, Query, Table};

use crate::db::{MotorlotSchemaMigrations, col_name, exec, exec_schema, query_all};
use motorlot_core::{LedgerEntry, MigrationUnit, MotorlotResult, Timestamp, Version};

pub async fn ensure_table<C: ConnectionTrait>(conn: &C) -> MotorlotResult<()> {
    exec_schema(
        conn,
        &Table::create()
            .table(MotorlotSchemaMigrations::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(MotorlotSchemaMigrations::Version)
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(MotorlotSchemaMigrations::Description)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(MotorlotSchemaMigrations::AppliedAt)
                    .big_integer()
                    .not_null(),
            )
            .to_owned(),
    )
    .await
}

/// Entries in application order.
pub async fn load<C: ConnectionTrait>(conn: &C) -> MotorlotResult<Vec<LedgerEntry>> {
    let select = Query::select()
        .columns([
            MotorlotSchemaMigrations::Version,
            MotorlotSchemaMigrations::Description,
            MotorlotSchemaMigrations::AppliedAt,
        ])
        .from(MotorlotSchemaMigrations::Table)
        .order_by(MotorlotSchemaMigrations::AppliedAt, Order::Asc)
        .order_by(MotorlotSchemaMigrations::Version, Order::Asc)
        .to_owned();
    let rows = query_all(conn, &select).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let version: String = row.try_get("", &col_name(MotorlotSchemaMigrations::Version))?;
        let description: String =
            row.try_get("", &col_name(MotorlotSchemaMigrations::Description))?;
        let applied_at: i64 = row.try_get("", &col_name(MotorlotSchemaMigrations::AppliedAt))?;
        entries.push(LedgerEntry {
            version: Version::new(version),
            description,
            applied_at: Timestamp::from_micros(applied_at),
        });
    }
    Ok(entries)
}

pub async fn record<C: ConnectionTrait>(
    conn: &C,
    unit: &MigrationUnit,
    applied_at: Timestamp,
) -> MotorlotResult<()> {
    let insert = Query::insert()
        .into_table(MotorlotSchemaMigrations::Table)
        .columns([
            MotorlotSchemaMigrations::Version,
            MotorlotSchemaMigrations::Description,
            MotorlotSchemaMigrations::AppliedAt,
        ])
        .values_panic([
            unit.version.as_str().into(),
            unit.description.as_str().into(),
            applied_at.as_micros().into(),
        ])
        .to_owned();
    exec(conn, &insert).await?;
    Ok(())
}

pub async fn remove<C: ConnectionTrait>(conn: &C, version: &Version) -> MotorlotResult<u64> {
    let delete = Query::delete()
        .from_table(MotorlotSchemaMigrations::Table)
        .and_where(Expr::col(MotorlotSchemaMigrations::Version).eq(version.as_str()))
        .to_owned();
    exec(conn, &delete).await
}
