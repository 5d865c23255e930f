use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20200301000001",
        "create categories",
        TableSpec::entity("Categories")
            .column(ColumnSpec::string("name").not_null().unique())
            .column(ColumnSpec::text("description"))
            .timestamps(),
    )
}
