use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000003",
        "create subdistricts",
        TableSpec::entity("Subdistricts")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::string_len("postalCode", 10))
            .column(ColumnSpec::foreign_key("cityId", "Cities", Cascade).not_null())
            .timestamps(),
    )
}
