use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000007",
        "create brands",
        TableSpec::entity("Brands")
            .column(ColumnSpec::string("name").not_null().unique())
            .column(ColumnSpec::string("logo"))
            .timestamps(),
    )
}
