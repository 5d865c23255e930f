use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000001",
        "create provinces",
        TableSpec::entity("Provinces")
            .column(ColumnSpec::string("name").not_null())
            .timestamps(),
    )
}
