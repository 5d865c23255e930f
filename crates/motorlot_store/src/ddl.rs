//! Translation of [`SchemaChange`]s into sea-query DDL executed through a `SchemaManager`.
//!
//! SQLite cannot alter foreign keys on existing tables, and sea-query panics when asked to
//! render such statements, so [`check_supported`] rejects them before anything is built.

use sea_orm::{ConnectionTrait, DatabaseBackend};
use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, ForeignKeyCreateStatement, Index,
    SimpleExpr, Table, TableCreateStatement,
};
use sea_orm_migration::SchemaManager;

use motorlot_core::schema::foreign_key_name;
use motorlot_core::{
    ColumnSpec, ColumnType, DefaultValue, ForeignKeySpec, IndexSpec, MotorlotError,
    MotorlotResult, ReferentialAction, SchemaChange, TableSpec,
};

// sea-query refuses larger precisions for SQLite `real` columns.
const SQLITE_MAX_DECIMAL_PRECISION: u32 = 16;

/// Errors for changes the backend cannot express.
pub fn check_supported(backend: DatabaseBackend, change: &SchemaChange) -> MotorlotResult<()> {
    if backend == DatabaseBackend::Sqlite {
        match change {
            SchemaChange::AddForeignKey { table, .. }
            | SchemaChange::RemoveForeignKey { table, .. } => {
                return Err(MotorlotError::invalid(format!(
                    "sqlite cannot change foreign keys on existing table '{table}'"
                )));
            }
            _ => {}
        }
        for column in columns_of(change) {
            if let ColumnType::Decimal { precision, .. } = column.column_type {
                if precision > SQLITE_MAX_DECIMAL_PRECISION {
                    return Err(MotorlotError::invalid(format!(
                        "sqlite decimal precision for '{}' exceeds {SQLITE_MAX_DECIMAL_PRECISION}",
                        column.name
                    )));
                }
            }
        }
    }
    for column in columns_of(change) {
        if let Some(DefaultValue::Decimal(literal)) = &column.default {
            if !is_decimal_literal(literal) {
                return Err(MotorlotError::invalid(format!(
                    "default for '{}' is not a decimal literal: {literal}",
                    column.name
                )));
            }
        }
    }
    if let SchemaChange::DropTable(spec) | SchemaChange::CreateTable(spec) = change {
        if spec.columns.is_empty() {
            return Err(MotorlotError::invalid(format!(
                "table '{}' has no columns",
                spec.name
            )));
        }
    }
    Ok(())
}

fn is_decimal_literal(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or("0");
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.chars().all(|c| c.is_ascii_digit())
}

fn columns_of(change: &SchemaChange) -> Vec<&ColumnSpec> {
    match change {
        SchemaChange::CreateTable(spec) | SchemaChange::DropTable(spec) => {
            spec.columns.iter().collect()
        }
        SchemaChange::AddColumn { column, .. } | SchemaChange::RemoveColumn { column, .. } => {
            vec![column]
        }
        _ => Vec::new(),
    }
}

/// Executes one change. Runs inside the caller's transaction.
pub async fn apply_change(manager: &SchemaManager<'_>, change: &SchemaChange) -> MotorlotResult<()> {
    let backend = manager.get_database_backend();
    check_supported(backend, change)?;
    match change {
        SchemaChange::CreateTable(spec) => {
            manager.create_table(create_table_stmt(spec)).await?;
            for index in &spec.indexes {
                create_index(manager, &spec.name, index).await?;
            }
        }
        SchemaChange::DropTable(spec) => {
            manager
                .drop_table(Table::drop().table(Alias::new(&spec.name)).to_owned())
                .await?;
        }
        SchemaChange::RenameTable { from, to } => {
            manager
                .rename_table(
                    Table::rename()
                        .table(Alias::new(from), Alias::new(to))
                        .to_owned(),
                )
                .await?;
        }
        SchemaChange::AddColumn { table, column } => {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(table))
                        .add_column(column_def(column))
                        .to_owned(),
                )
                .await?;
            if let Some(reference) = &column.references {
                if backend == DatabaseBackend::Sqlite {
                    log::debug!(
                        "sqlite: foreign key {table}.{} -> {} tracked in the model only",
                        column.name,
                        reference.table
                    );
                } else {
                    manager
                        .create_foreign_key(foreign_key_stmt(table, &column.name, reference))
                        .await?;
                }
            }
        }
        SchemaChange::RemoveColumn { table, column } => {
            if column.references.is_some() && backend != DatabaseBackend::Sqlite {
                manager
                    .drop_foreign_key(
                        ForeignKey::drop()
                            .name(foreign_key_name(table, &column.name))
                            .table(Alias::new(table))
                            .to_owned(),
                    )
                    .await?;
            }
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(table))
                        .drop_column(Alias::new(&column.name))
                        .to_owned(),
                )
                .await?;
        }
        SchemaChange::RenameColumn { table, from, to } => {
            manager
                .alter_table(
                    Table::alter()
                        .table(Alias::new(table))
                        .rename_column(Alias::new(from), Alias::new(to))
                        .to_owned(),
                )
                .await?;
        }
        SchemaChange::AddIndex { table, index } => {
            create_index(manager, table, index).await?;
        }
        SchemaChange::RemoveIndex { table, index } => {
            manager
                .drop_index(
                    Index::drop()
                        .name(&index.name)
                        .table(Alias::new(table))
                        .to_owned(),
                )
                .await?;
        }
        SchemaChange::AddForeignKey { table, constraint } => {
            let mut stmt = foreign_key_stmt(table, &constraint.column, &constraint.references);
            manager
                .create_foreign_key(stmt.name(&constraint.name).to_owned())
                .await?;
        }
        SchemaChange::RemoveForeignKey { table, constraint } => {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name(&constraint.name)
                        .table(Alias::new(table))
                        .to_owned(),
                )
                .await?;
        }
        SchemaChange::RawSql { up, .. } => {
            manager.get_connection().execute_unprepared(up).await?;
        }
    }
    Ok(())
}

async fn create_index(
    manager: &SchemaManager<'_>,
    table: &str,
    index: &IndexSpec,
) -> MotorlotResult<()> {
    let mut stmt = Index::create();
    stmt.name(&index.name).table(Alias::new(table));
    for column in &index.columns {
        stmt.col(Alias::new(column));
    }
    if index.unique {
        stmt.unique();
    }
    manager.create_index(stmt.to_owned()).await?;
    Ok(())
}

pub fn create_table_stmt(spec: &TableSpec) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(&spec.name));
    for column in &spec.columns {
        stmt.col(column_def(column));
    }
    for column in &spec.columns {
        if let Some(reference) = &column.references {
            stmt.foreign_key(&mut foreign_key_stmt(&spec.name, &column.name, reference));
        }
    }
    stmt.to_owned()
}

fn foreign_key_stmt(
    table: &str,
    column: &str,
    reference: &ForeignKeySpec,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(foreign_key_name(table, column))
        .from(Alias::new(table), Alias::new(column))
        .to(Alias::new(&reference.table), Alias::new(&reference.column))
        .on_delete(action(reference.on_delete))
        .on_update(action(reference.on_update))
        .to_owned()
}

fn action(action: ReferentialAction) -> ForeignKeyAction {
    match action {
        ReferentialAction::Cascade => ForeignKeyAction::Cascade,
        ReferentialAction::SetNull => ForeignKeyAction::SetNull,
        ReferentialAction::Restrict => ForeignKeyAction::Restrict,
        ReferentialAction::NoAction => ForeignKeyAction::NoAction,
    }
}

pub fn column_def(column: &ColumnSpec) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(&column.name));
    match column.column_type {
        ColumnType::Integer => def.integer(),
        ColumnType::BigInteger => def.big_integer(),
        ColumnType::Decimal { precision, scale } => def.decimal_len(precision, scale),
        ColumnType::String { length: Some(length) } => def.string_len(length),
        ColumnType::String { length: None } => def.string(),
        ColumnType::Text => def.text(),
        ColumnType::Boolean => def.boolean(),
        ColumnType::Timestamp => def.timestamp_with_time_zone(),
        ColumnType::Time => def.time(),
    };
    if column.nullable {
        def.null();
    } else {
        def.not_null();
    }
    if let Some(default) = &column.default {
        def.default(default_expr(default));
    }
    if column.unique {
        def.unique_key();
    }
    if column.auto_increment {
        def.auto_increment();
    }
    if column.primary_key {
        def.primary_key();
    }
    def.to_owned()
}

fn default_expr(default: &DefaultValue) -> SimpleExpr {
    match default {
        DefaultValue::Integer(value) => (*value).into(),
        // Checked by `is_decimal_literal` before any statement is built.
        DefaultValue::Decimal(value) => Expr::cust(value.clone()),
        DefaultValue::Text(value) => value.clone().into(),
        DefaultValue::Boolean(value) => (*value).into(),
        DefaultValue::CurrentTimestamp => Expr::current_timestamp().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::{ColumnSpec, ForeignKeyConstraint};
    use sea_orm::sea_query::{SchemaStatementBuilder, SqliteQueryBuilder};

    #[test]
    fn sqlite_rejects_foreign_key_alters() {
        let change = SchemaChange::AddForeignKey {
            table: "Cars".into(),
            constraint: ForeignKeyConstraint::new(
                "Cars",
                "categoryId",
                ForeignKeySpec::to_id("Categories", ReferentialAction::SetNull),
            ),
        };
        assert!(check_supported(DatabaseBackend::Sqlite, &change).is_err());
        assert!(check_supported(DatabaseBackend::Postgres, &change).is_ok());
    }

    #[test]
    fn sqlite_rejects_wide_decimals() {
        let change = SchemaChange::AddColumn {
            table: "Cars".into(),
            column: ColumnSpec::decimal("price", 20, 2),
        };
        assert!(check_supported(DatabaseBackend::Sqlite, &change).is_err());
    }

    #[test]
    fn decimal_defaults_must_be_literals() {
        let column = ColumnSpec::decimal("price", 15, 2).default_value(DefaultValue::Decimal(
            "0; DROP TABLE Cars".into(),
        ));
        let change = SchemaChange::AddColumn {
            table: "Cars".into(),
            column,
        };
        assert!(check_supported(DatabaseBackend::Postgres, &change).is_err());
        assert!(is_decimal_literal("-12.50"));
        assert!(is_decimal_literal("7"));
        assert!(!is_decimal_literal("1."));
    }

    #[test]
    fn create_table_renders_inline_foreign_keys() {
        let spec = TableSpec::entity("Cars")
            .column(ColumnSpec::foreign_key(
                "userId",
                "Users",
                ReferentialAction::Cascade,
            ))
            .column(ColumnSpec::decimal("price", 15, 2).not_null())
            .timestamps()
            .paranoid();
        let sql = create_table_stmt(&spec).to_string(SqliteQueryBuilder);
        assert!(sql.contains("CREATE TABLE \"Cars\""), "{sql}");
        assert!(sql.contains("AUTOINCREMENT"), "{sql}");
        assert!(sql.contains("FOREIGN KEY (\"userId\") REFERENCES \"Users\" (\"id\")"), "{sql}");
        assert!(sql.contains("ON DELETE CASCADE"), "{sql}");
    }
}
