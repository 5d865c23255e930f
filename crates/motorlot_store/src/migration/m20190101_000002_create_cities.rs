use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000002",
        "create cities",
        TableSpec::entity("Cities")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::foreign_key("provinceId", "Provinces", Cascade).not_null())
            .timestamps(),
    )
}
