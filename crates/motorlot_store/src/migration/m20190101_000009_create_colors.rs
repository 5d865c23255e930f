use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000009",
        "create colors",
        TableSpec::entity("Colors")
            .column(ColumnSpec::string("name").not_null().unique())
            .column(ColumnSpec::string_len("hex", 7))
            .timestamps(),
    )
}
