use motorlot_core::ReferentialAction::{Cascade, SetNull};
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000010",
        "create models",
        TableSpec::entity("Models")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::foreign_key("brandId", "Brands", Cascade).not_null())
            .column(ColumnSpec::foreign_key("typeId", "Types", SetNull))
            .timestamps(),
    )
}
