use serde::{Deserialize, Serialize};

use crate::schema::{ColumnSpec, ForeignKeyConstraint, IndexSpec, TableSpec};
use crate::{MotorlotError, MotorlotResult, Version};

/// One structural operation against a single table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchemaChange {
    CreateTable(TableSpec),
    /// Carries the full definition so the inverse can recreate it.
    DropTable(TableSpec),
    RenameTable {
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: ColumnSpec,
    },
    /// Carries the full definition so the inverse can re-add it.
    RemoveColumn {
        table: String,
        column: ColumnSpec,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AddIndex {
        table: String,
        index: IndexSpec,
    },
    RemoveIndex {
        table: String,
        index: IndexSpec,
    },
    AddForeignKey {
        table: String,
        constraint: ForeignKeyConstraint,
    },
    RemoveForeignKey {
        table: String,
        constraint: ForeignKeyConstraint,
    },
    /// Opaque statement. Without `down` the change cannot be reversed.
    RawSql {
        table: String,
        up: String,
        down: Option<String>,
    },
}

impl SchemaChange {
    pub fn table(&self) -> &str {
        match self {
            SchemaChange::CreateTable(spec) | SchemaChange::DropTable(spec) => &spec.name,
            SchemaChange::RenameTable { from, .. } => from,
            SchemaChange::AddColumn { table, .. }
            | SchemaChange::RemoveColumn { table, .. }
            | SchemaChange::RenameColumn { table, .. }
            | SchemaChange::AddIndex { table, .. }
            | SchemaChange::RemoveIndex { table, .. }
            | SchemaChange::AddForeignKey { table, .. }
            | SchemaChange::RemoveForeignKey { table, .. }
            | SchemaChange::RawSql { table, .. } => table,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            SchemaChange::CreateTable(_) => "create_table",
            SchemaChange::DropTable(_) => "drop_table",
            SchemaChange::RenameTable { .. } => "rename_table",
            SchemaChange::AddColumn { .. } => "add_column",
            SchemaChange::RemoveColumn { .. } => "remove_column",
            SchemaChange::RenameColumn { .. } => "rename_column",
            SchemaChange::AddIndex { .. } => "add_index",
            SchemaChange::RemoveIndex { .. } => "remove_index",
            SchemaChange::AddForeignKey { .. } => "add_foreign_key",
            SchemaChange::RemoveForeignKey { .. } => "remove_foreign_key",
            SchemaChange::RawSql { .. } => "raw_sql",
        }
    }

    /// Exact structural inverse, `None` for raw SQL without a `down` statement.
    pub fn inverse(&self) -> Option<SchemaChange> {
        let inverse = match self {
            SchemaChange::CreateTable(spec) => SchemaChange::DropTable(spec.clone()),
            SchemaChange::DropTable(spec) => SchemaChange::CreateTable(spec.clone()),
            SchemaChange::RenameTable { from, to } => SchemaChange::RenameTable {
                from: to.clone(),
                to: from.clone(),
            },
            SchemaChange::AddColumn { table, column } => SchemaChange::RemoveColumn {
                table: table.clone(),
                column: column.clone(),
            },
            SchemaChange::RemoveColumn { table, column } => SchemaChange::AddColumn {
                table: table.clone(),
                column: column.clone(),
            },
            SchemaChange::RenameColumn { table, from, to } => SchemaChange::RenameColumn {
                table: table.clone(),
                from: to.clone(),
                to: from.clone(),
            },
            SchemaChange::AddIndex { table, index } => SchemaChange::RemoveIndex {
                table: table.clone(),
                index: index.clone(),
            },
            SchemaChange::RemoveIndex { table, index } => SchemaChange::AddIndex {
                table: table.clone(),
                index: index.clone(),
            },
            SchemaChange::AddForeignKey { table, constraint } => SchemaChange::RemoveForeignKey {
                table: table.clone(),
                constraint: constraint.clone(),
            },
            SchemaChange::RemoveForeignKey { table, constraint } => SchemaChange::AddForeignKey {
                table: table.clone(),
                constraint: constraint.clone(),
            },
            SchemaChange::RawSql { table, up, down } => SchemaChange::RawSql {
                table: table.clone(),
                up: down.clone()?,
                down: Some(up.clone()),
            },
        };
        Some(inverse)
    }
}

/// A versioned, named, reversible group of changes against one table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationUnit {
    pub version: Version,
    pub description: String,
    pub changes: Vec<SchemaChange>,
}

impl MigrationUnit {
    pub fn new(version: impl Into<Version>, description: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            changes: Vec::new(),
        }
    }

    pub fn change(mut self, change: SchemaChange) -> Self {
        self.changes.push(change);
        self
    }

    pub fn create_table(
        version: impl Into<Version>,
        description: impl Into<String>,
        table: TableSpec,
    ) -> Self {
        Self::new(version, description).change(SchemaChange::CreateTable(table))
    }

    pub fn add_column(
        version: impl Into<Version>,
        description: impl Into<String>,
        table: impl Into<String>,
        column: ColumnSpec,
    ) -> Self {
        Self::new(version, description).change(SchemaChange::AddColumn {
            table: table.into(),
            column,
        })
    }

    pub fn rename_column(
        version: impl Into<Version>,
        description: impl Into<String>,
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::new(version, description).change(SchemaChange::RenameColumn {
            table: table.into(),
            from: from.into(),
            to: to.into(),
        })
    }

    /// Table the unit operates on (the first change's table).
    pub fn table(&self) -> &str {
        self.changes
            .first()
            .map(SchemaChange::table)
            .unwrap_or_default()
    }

    /// A unit must be non-empty and touch a single table. A table rename switches the
    /// table name seen by the changes that follow it.
    pub fn validate(&self) -> MotorlotResult<()> {
        self.version.validate()?;
        let Some(first) = self.changes.first() else {
            return Err(MotorlotError::invalid(format!(
                "migration {} has no changes",
                self.version
            )));
        };
        let mut current = first.table().to_string();
        for change in &self.changes {
            if change.table() != current {
                return Err(MotorlotError::invalid(format!(
                    "migration {} touches '{}' and '{}'; a unit targets one table",
                    self.version,
                    current,
                    change.table()
                )));
            }
            if let SchemaChange::RenameTable { to, .. } = change {
                current = to.clone();
            }
        }
        Ok(())
    }

    pub fn is_reversible(&self) -> bool {
        self.changes.iter().all(|change| change.inverse().is_some())
    }

    /// Inverse changes in reverse order, `None` when any change is irreversible.
    pub fn inverse_changes(&self) -> Option<Vec<SchemaChange>> {
        self.changes.iter().rev().map(SchemaChange::inverse).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;

    #[test]
    fn inverse_of_inverse_is_identity() {
        let changes = vec![
            SchemaChange::CreateTable(TableSpec::entity("Cars").timestamps()),
            SchemaChange::AddColumn {
                table: "Cars".into(),
                column: ColumnSpec::integer("categoryId"),
            },
            SchemaChange::RenameColumn {
                table: "Users".into(),
                from: "subDistictId".into(),
                to: "subdistrictId".into(),
            },
            SchemaChange::AddIndex {
                table: "Users".into(),
                index: IndexSpec::new("users_email_unique", ["email"]).unique(),
            },
            SchemaChange::RenameTable {
                from: "CarCategories".into(),
                to: "Categories".into(),
            },
            SchemaChange::RawSql {
                table: "Cars".into(),
                up: "UPDATE Cars SET status = 'draft'".into(),
                down: Some("UPDATE Cars SET status = NULL".into()),
            },
        ];
        for change in changes {
            let inverse = change.inverse().expect("reversible");
            assert_eq!(inverse.inverse().expect("reversible"), change);
        }
    }

    #[test]
    fn raw_sql_without_down_is_irreversible() {
        let unit = MigrationUnit::new("2020-05", "backfill").change(SchemaChange::RawSql {
            table: "Cars".into(),
            up: "UPDATE Cars SET status = 'draft'".into(),
            down: None,
        });
        assert!(!unit.is_reversible());
        assert!(unit.inverse_changes().is_none());
    }

    #[test]
    fn inverse_changes_run_in_reverse_order() {
        let unit = MigrationUnit::create_table("2019-01", "create cars", TableSpec::entity("Cars"))
            .change(SchemaChange::AddIndex {
                table: "Cars".into(),
                index: IndexSpec::new("cars_id_idx", ["id"]),
            });
        let inverse = unit.inverse_changes().unwrap();
        assert_eq!(inverse[0].operation(), "remove_index");
        assert_eq!(inverse[1].operation(), "drop_table");
    }

    #[test]
    fn validate_rejects_multi_table_units() {
        let unit = MigrationUnit::create_table("2019-01", "two tables", TableSpec::entity("Cars"))
            .change(SchemaChange::CreateTable(TableSpec::entity("Brands")));
        assert!(unit.validate().is_err());
        let empty = MigrationUnit::new("2019-02", "nothing");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn validate_follows_table_renames() {
        let unit = MigrationUnit::new("2020-01", "rename then index")
            .change(SchemaChange::RenameTable {
                from: "CarCategories".into(),
                to: "Categories".into(),
            })
            .change(SchemaChange::AddIndex {
                table: "Categories".into(),
                index: IndexSpec::new("categories_name", ["name"]),
            });
        assert!(unit.validate().is_ok());
    }
}
