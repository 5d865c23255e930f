//! In-memory model of a schema's structure.
//!
//! Applying [`SchemaChange`]s here mirrors what the store does to a live database, with the
//! same conflicts a real engine reports (duplicate column, missing table, dropping a column an
//! index still uses). It backs the round-trip checks on migration units and the parity check
//! between the migration catalog and the model registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::change::{MigrationUnit, SchemaChange};
use crate::schema::{ColumnSpec, ForeignKeyConstraint, IndexSpec, TableSpec};
use crate::{MotorlotError, MotorlotResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub columns: BTreeMap<String, ColumnSpec>,
    pub indexes: BTreeMap<String, IndexSpec>,
    pub foreign_keys: BTreeMap<String, ForeignKeyConstraint>,
}

impl TableShape {
    fn from_spec(spec: &TableSpec) -> MotorlotResult<Self> {
        let mut shape = TableShape::default();
        for column in &spec.columns {
            if shape
                .columns
                .insert(column.name.clone(), column.clone())
                .is_some()
            {
                return Err(MotorlotError::conflict(format!(
                    "table '{}' declares column '{}' twice",
                    spec.name, column.name
                )));
            }
        }
        for index in &spec.indexes {
            shape.insert_index(&spec.name, index)?;
        }
        Ok(shape)
    }

    fn insert_index(&mut self, table: &str, index: &IndexSpec) -> MotorlotResult<()> {
        for column in &index.columns {
            if !self.columns.contains_key(column) {
                return Err(MotorlotError::not_found(format!(
                    "index '{}' uses missing column {table}.{column}",
                    index.name
                )));
            }
        }
        if self.indexes.contains_key(&index.name) {
            return Err(MotorlotError::conflict(format!(
                "index '{}' already exists on '{table}'",
                index.name
            )));
        }
        self.indexes.insert(index.name.clone(), index.clone());
        Ok(())
    }

    /// Rebuilds a table definition. Column order is not tracked, so columns come back sorted.
    pub fn to_spec(&self, name: &str) -> TableSpec {
        TableSpec {
            name: name.to_string(),
            columns: self.columns.values().cloned().collect(),
            indexes: self.indexes.values().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaShape {
    pub tables: BTreeMap<String, TableShape>,
}

impl SchemaShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|shape| shape.columns.contains_key(column))
    }

    pub fn table(&self, table: &str) -> Option<&TableShape> {
        self.tables.get(table)
    }

    /// Column definitions per table, ignoring indexes and named constraints.
    pub fn column_layout(&self) -> BTreeMap<String, BTreeMap<String, ColumnSpec>> {
        self.tables
            .iter()
            .map(|(name, shape)| (name.clone(), shape.columns.clone()))
            .collect()
    }

    pub fn apply_all<'a, I>(&mut self, units: I) -> MotorlotResult<()>
    where
        I: IntoIterator<Item = &'a MigrationUnit>,
    {
        for unit in units {
            self.apply_unit(unit)?;
        }
        Ok(())
    }

    /// Applies every change of the unit; on error the shape is left untouched.
    pub fn apply_unit(&mut self, unit: &MigrationUnit) -> MotorlotResult<()> {
        let mut next = self.clone();
        for change in &unit.changes {
            next.apply(change).map_err(|err| {
                MotorlotError::migration_failed(
                    unit.version.as_str(),
                    change.table(),
                    change.operation(),
                    err.to_string(),
                )
            })?;
        }
        *self = next;
        Ok(())
    }

    /// Applies the unit's inverse; irreversible units are rejected.
    pub fn revert_unit(&mut self, unit: &MigrationUnit) -> MotorlotResult<()> {
        let inverse = unit.inverse_changes().ok_or_else(|| {
            MotorlotError::rollback_failed(
                unit.version.as_str(),
                "unit contains raw SQL without a down statement",
                Vec::new(),
            )
        })?;
        let mut next = self.clone();
        for change in &inverse {
            next.apply(change).map_err(|err| {
                MotorlotError::rollback_failed(unit.version.as_str(), err.to_string(), Vec::new())
            })?;
        }
        *self = next;
        Ok(())
    }

    pub fn apply(&mut self, change: &SchemaChange) -> MotorlotResult<()> {
        match change {
            SchemaChange::CreateTable(spec) => {
                if self.has_table(&spec.name) {
                    return Err(MotorlotError::conflict(format!(
                        "table '{}' already exists",
                        spec.name
                    )));
                }
                let shape = TableShape::from_spec(spec)?;
                self.tables.insert(spec.name.clone(), shape);
            }
            SchemaChange::DropTable(spec) => {
                let current = self.table_mut(&spec.name)?;
                if *current != TableShape::from_spec(spec)? {
                    return Err(MotorlotError::conflict(format!(
                        "drop of '{}' carries a definition that differs from the live table",
                        spec.name
                    )));
                }
                self.tables.remove(&spec.name);
            }
            SchemaChange::RenameTable { from, to } => {
                if self.has_table(to) {
                    return Err(MotorlotError::conflict(format!("table '{to}' already exists")));
                }
                let shape = self.tables.remove(from).ok_or_else(|| missing_table(from))?;
                self.tables.insert(to.clone(), shape);
                self.retarget_references(from, None, to, None);
            }
            SchemaChange::AddColumn { table, column } => {
                let shape = self.table_mut(table)?;
                if shape.columns.contains_key(&column.name) {
                    return Err(MotorlotError::conflict(format!(
                        "duplicate column name: {table}.{}",
                        column.name
                    )));
                }
                shape.columns.insert(column.name.clone(), column.clone());
            }
            SchemaChange::RemoveColumn { table, column } => {
                let shape = self.table_mut(table)?;
                let current = shape
                    .columns
                    .get(&column.name)
                    .ok_or_else(|| missing_column(table, &column.name))?;
                if current != column {
                    return Err(MotorlotError::conflict(format!(
                        "removal of {table}.{} carries a definition that differs from the live column",
                        column.name
                    )));
                }
                if let Some(index) = shape
                    .indexes
                    .values()
                    .find(|index| index.columns.contains(&column.name))
                {
                    return Err(MotorlotError::conflict(format!(
                        "cannot drop {table}.{}: used by index '{}'",
                        column.name, index.name
                    )));
                }
                if let Some(fk) = shape
                    .foreign_keys
                    .values()
                    .find(|fk| fk.column == column.name)
                {
                    return Err(MotorlotError::conflict(format!(
                        "cannot drop {table}.{}: used by constraint '{}'",
                        column.name, fk.name
                    )));
                }
                shape.columns.remove(&column.name);
            }
            SchemaChange::RenameColumn { table, from, to } => {
                let shape = self.table_mut(table)?;
                if shape.columns.contains_key(to) {
                    return Err(MotorlotError::conflict(format!(
                        "duplicate column name: {table}.{to}"
                    )));
                }
                let column = shape
                    .columns
                    .remove(from)
                    .ok_or_else(|| missing_column(table, from))?;
                shape.columns.insert(to.clone(), column.renamed(to.clone()));
                for index in shape.indexes.values_mut() {
                    for name in index.columns.iter_mut().filter(|name| *name == from) {
                        *name = to.clone();
                    }
                }
                for fk in shape.foreign_keys.values_mut().filter(|fk| fk.column == *from) {
                    fk.column = to.clone();
                }
                self.retarget_references(table, Some(from), table, Some(to));
            }
            SchemaChange::AddIndex { table, index } => {
                self.table_mut(table)?.insert_index(table, index)?;
            }
            SchemaChange::RemoveIndex { table, index } => {
                let shape = self.table_mut(table)?;
                match shape.indexes.get(&index.name) {
                    Some(current) if current == index => {
                        shape.indexes.remove(&index.name);
                    }
                    Some(_) => {
                        return Err(MotorlotError::conflict(format!(
                            "index '{}' on '{table}' differs from the one being removed",
                            index.name
                        )));
                    }
                    None => {
                        return Err(MotorlotError::not_found(format!(
                            "index '{}' on '{table}'",
                            index.name
                        )));
                    }
                }
            }
            SchemaChange::AddForeignKey { table, constraint } => {
                let referenced = &constraint.references.table;
                if !self.has_column(referenced, &constraint.references.column) {
                    return Err(missing_column(referenced, &constraint.references.column));
                }
                let shape = self.table_mut(table)?;
                if !shape.columns.contains_key(&constraint.column) {
                    return Err(missing_column(table, &constraint.column));
                }
                if shape.foreign_keys.contains_key(&constraint.name) {
                    return Err(MotorlotError::conflict(format!(
                        "constraint '{}' already exists on '{table}'",
                        constraint.name
                    )));
                }
                shape
                    .foreign_keys
                    .insert(constraint.name.clone(), constraint.clone());
            }
            SchemaChange::RemoveForeignKey { table, constraint } => {
                let shape = self.table_mut(table)?;
                if shape.foreign_keys.remove(&constraint.name).is_none() {
                    return Err(MotorlotError::not_found(format!(
                        "constraint '{}' on '{table}'",
                        constraint.name
                    )));
                }
            }
            // Opaque to the structural model.
            SchemaChange::RawSql { table, .. } => {
                self.table_mut(table)?;
            }
        }
        Ok(())
    }

    fn table_mut(&mut self, table: &str) -> MotorlotResult<&mut TableShape> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))
    }

    /// Keeps references pointing at a renamed table or column valid.
    fn retarget_references(
        &mut self,
        from_table: &str,
        from_column: Option<&str>,
        to_table: &str,
        to_column: Option<&str>,
    ) {
        let matches = |table: &str, column: &str| {
            table == from_table && from_column.is_none_or(|from| from == column)
        };
        for shape in self.tables.values_mut() {
            for column in shape.columns.values_mut() {
                if let Some(reference) = column.references.as_mut() {
                    if matches(&reference.table, &reference.column) {
                        reference.table = to_table.to_string();
                        if let Some(to) = to_column {
                            reference.column = to.to_string();
                        }
                    }
                }
            }
            for fk in shape.foreign_keys.values_mut() {
                if matches(&fk.references.table, &fk.references.column) {
                    fk.references.table = to_table.to_string();
                    if let Some(to) = to_column {
                        fk.references.column = to.to_string();
                    }
                }
            }
        }
    }
}

fn missing_table(table: &str) -> MotorlotError {
    MotorlotError::not_found(format!("no such table: {table}"))
}

fn missing_column(table: &str, column: &str) -> MotorlotError {
    MotorlotError::not_found(format!("no such column: {table}.{column}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ForeignKeySpec, ReferentialAction};

    fn base_shape() -> SchemaShape {
        let mut shape = SchemaShape::new();
        shape
            .apply(&SchemaChange::CreateTable(
                TableSpec::entity("Categories").column(ColumnSpec::string("name")),
            ))
            .unwrap();
        shape
            .apply(&SchemaChange::CreateTable(
                TableSpec::entity("Users")
                    .column(ColumnSpec::string("email").not_null().unique())
                    .column(ColumnSpec::integer("subDistictId"))
                    .timestamps()
                    .paranoid(),
            ))
            .unwrap();
        shape
            .apply(&SchemaChange::CreateTable(
                TableSpec::entity("Cars")
                    .column(ColumnSpec::foreign_key(
                        "userId",
                        "Users",
                        ReferentialAction::Cascade,
                    ))
                    .column(ColumnSpec::string("status"))
                    .index(IndexSpec::new("cars_status", ["status"]))
                    .timestamps()
                    .paranoid(),
            ))
            .unwrap();
        shape
    }

    fn assert_round_trip(change: SchemaChange) {
        let original = base_shape();
        let mut shape = original.clone();
        shape.apply(&change).expect("forward");
        assert_ne!(shape, original, "{} must change the shape", change.operation());
        shape
            .apply(&change.inverse().expect("reversible"))
            .expect("inverse");
        assert_eq!(shape, original, "{} must round-trip", change.operation());
    }

    #[test]
    fn every_reversible_change_round_trips() {
        assert_round_trip(SchemaChange::CreateTable(
            TableSpec::entity("Galleries")
                .column(ColumnSpec::foreign_key(
                    "carId",
                    "Cars",
                    ReferentialAction::Cascade,
                ))
                .paranoid(),
        ));
        assert_round_trip(SchemaChange::DropTable(
            TableSpec::entity("Categories").column(ColumnSpec::string("name")),
        ));
        assert_round_trip(SchemaChange::RenameTable {
            from: "Categories".into(),
            to: "CarCategories".into(),
        });
        assert_round_trip(SchemaChange::AddColumn {
            table: "Cars".into(),
            column: ColumnSpec::foreign_key("categoryId", "Categories", ReferentialAction::SetNull),
        });
        assert_round_trip(SchemaChange::RemoveColumn {
            table: "Users".into(),
            column: ColumnSpec::integer("subDistictId"),
        });
        assert_round_trip(SchemaChange::RenameColumn {
            table: "Users".into(),
            from: "subDistictId".into(),
            to: "subdistrictId".into(),
        });
        assert_round_trip(SchemaChange::AddIndex {
            table: "Cars".into(),
            index: IndexSpec::new("cars_user", ["userId"]),
        });
        assert_round_trip(SchemaChange::RemoveIndex {
            table: "Cars".into(),
            index: IndexSpec::new("cars_status", ["status"]),
        });
        assert_round_trip(SchemaChange::AddForeignKey {
            table: "Users".into(),
            constraint: ForeignKeyConstraint::new(
                "Users",
                "subDistictId",
                ForeignKeySpec::to_id("Categories", ReferentialAction::SetNull),
            ),
        });
    }

    #[test]
    fn duplicate_column_is_a_conflict() {
        let mut shape = base_shape();
        let add = SchemaChange::AddColumn {
            table: "Cars".into(),
            column: ColumnSpec::integer("categoryId"),
        };
        shape.apply(&add).unwrap();
        let err = shape.apply(&add).unwrap_err();
        assert!(matches!(err, MotorlotError::Conflict { .. }));
    }

    #[test]
    fn dropping_an_indexed_column_is_refused() {
        let mut shape = base_shape();
        let err = shape
            .apply(&SchemaChange::RemoveColumn {
                table: "Cars".into(),
                column: ColumnSpec::string("status"),
            })
            .unwrap_err();
        assert!(matches!(err, MotorlotError::Conflict { .. }));
    }

    #[test]
    fn table_rename_keeps_references_valid() {
        let mut shape = base_shape();
        shape
            .apply(&SchemaChange::RenameTable {
                from: "Users".into(),
                to: "Accounts".into(),
            })
            .unwrap();
        let cars = shape.table("Cars").unwrap();
        let user_id = cars.columns.get("userId").unwrap();
        assert_eq!(user_id.references.as_ref().unwrap().table, "Accounts");
    }

    #[test]
    fn column_rename_updates_indexes() {
        let mut shape = base_shape();
        shape
            .apply(&SchemaChange::RenameColumn {
                table: "Cars".into(),
                from: "status".into(),
                to: "state".into(),
            })
            .unwrap();
        let index = shape.table("Cars").unwrap().indexes.get("cars_status").unwrap();
        assert_eq!(index.columns, vec!["state".to_string()]);
    }

    #[test]
    fn failed_unit_leaves_shape_untouched() {
        let mut shape = base_shape();
        let before = shape.clone();
        let unit = MigrationUnit::new("2020-03", "half broken")
            .change(SchemaChange::AddColumn {
                table: "Cars".into(),
                column: ColumnSpec::integer("mileage"),
            })
            .change(SchemaChange::AddColumn {
                table: "Cars".into(),
                column: ColumnSpec::integer("mileage"),
            });
        let err = shape.apply_unit(&unit).unwrap_err();
        assert!(matches!(err, MotorlotError::MigrationFailed { ref version, .. } if version == "2020-03"));
        assert_eq!(shape, before);
    }

    #[test]
    fn irreversible_unit_cannot_be_reverted() {
        let mut shape = base_shape();
        let unit = MigrationUnit::new("2020-05", "backfill").change(SchemaChange::RawSql {
            table: "Cars".into(),
            up: "UPDATE Cars SET status = 'draft'".into(),
            down: None,
        });
        shape.apply_unit(&unit).unwrap();
        let err = shape.revert_unit(&unit).unwrap_err();
        assert!(matches!(err, MotorlotError::RollbackFailed { .. }));
    }
}
