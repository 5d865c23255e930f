use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000008",
        "create types",
        TableSpec::entity("Types")
            .column(ColumnSpec::string("name").not_null().unique())
            .timestamps(),
    )
}
