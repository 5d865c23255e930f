//! Advisory single-writer lock for migration runs.
//!
//! The lock is a single row with a fixed primary key. Acquiring inserts the row; a conflict
//! means another runner holds it, and the caller fails immediately without retrying.

use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{ColumnDef, Expr, OnConflict, Query, Table};

use crate::db::{MotorlotMigrationLock, col_name, exec, exec_schema, query_one};
use motorlot_core::{MotorlotError, MotorlotResult, Timestamp};

const LOCK_ROW_ID: i64 = 1;

#[derive(Debug)]
#[must_use = "a held migration lock must be released"]
pub struct MigrationLock {
    holder: String,
}

impl MigrationLock {
    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub async fn release<C: ConnectionTrait>(self, conn: &C) -> MotorlotResult<()> {
        let delete = Query::delete()
            .from_table(MotorlotMigrationLock::Table)
            .and_where(Expr::col(MotorlotMigrationLock::Id).eq(LOCK_ROW_ID))
            .and_where(Expr::col(MotorlotMigrationLock::Holder).eq(self.holder.as_str()))
            .to_owned();
        if exec(conn, &delete).await? == 0 {
            log::warn!("migration lock for {} was already released", self.holder);
        }
        Ok(())
    }
}

pub async fn ensure_table<C: ConnectionTrait>(conn: &C) -> MotorlotResult<()> {
    exec_schema(
        conn,
        &Table::create()
            .table(MotorlotMigrationLock::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(MotorlotMigrationLock::Id)
                    .big_integer()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(MotorlotMigrationLock::Holder)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(MotorlotMigrationLock::AcquiredAt)
                    .big_integer()
                    .not_null(),
            )
            .to_owned(),
    )
    .await
}

pub async fn acquire<C: ConnectionTrait>(conn: &C, holder: &str) -> MotorlotResult<MigrationLock> {
    ensure_table(conn).await?;
    let insert = Query::insert()
        .into_table(MotorlotMigrationLock::Table)
        .columns([
            MotorlotMigrationLock::Id,
            MotorlotMigrationLock::Holder,
            MotorlotMigrationLock::AcquiredAt,
        ])
        .values_panic([
            LOCK_ROW_ID.into(),
            holder.into(),
            Timestamp::now().as_micros().into(),
        ])
        .on_conflict(
            OnConflict::column(MotorlotMigrationLock::Id)
                .do_nothing()
                .to_owned(),
        )
        .to_owned();
    if exec(conn, &insert).await? == 0 {
        let current = current_holder(conn)
            .await?
            .unwrap_or_else(|| "unknown".to_string());
        return Err(MotorlotError::concurrent_migration(current));
    }
    log::debug!("migration lock acquired by {holder}");
    Ok(MigrationLock {
        holder: holder.to_string(),
    })
}

pub async fn current_holder<C: ConnectionTrait>(conn: &C) -> MotorlotResult<Option<String>> {
    ensure_table(conn).await?;
    let select = Query::select()
        .column(MotorlotMigrationLock::Holder)
        .from(MotorlotMigrationLock::Table)
        .and_where(Expr::col(MotorlotMigrationLock::Id).eq(LOCK_ROW_ID))
        .to_owned();
    let Some(row) = query_one(conn, &select).await? else {
        return Ok(None);
    };
    let holder: String = row.try_get("", &col_name(MotorlotMigrationLock::Holder))?;
    Ok(Some(holder))
}

/// Clears the lock regardless of holder. Returns whether a lock was held.
pub async fn force_unlock<C: ConnectionTrait>(conn: &C) -> MotorlotResult<bool> {
    ensure_table(conn).await?;
    let delete = Query::delete()
        .from_table(MotorlotMigrationLock::Table)
        .and_where(Expr::col(MotorlotMigrationLock::Id).eq(LOCK_ROW_ID))
        .to_owned();
    let removed = exec(conn, &delete).await?;
    if removed > 0 {
        log::warn!("migration lock forcibly released");
    }
    Ok(removed > 0)
}

/// Default holder label for this process.
pub fn default_holder() -> String {
    format!(
        "pid-{}-{}",
        std::process::id(),
        Timestamp::now().as_micros()
    )
}
