use motorlot_core::ReferentialAction::{Cascade, SetNull};
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000006",
        "create dealers",
        TableSpec::entity("Dealers")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::text("address"))
            .column(ColumnSpec::string("phone"))
            .column(ColumnSpec::time("openTime"))
            .column(ColumnSpec::time("closeTime"))
            .column(ColumnSpec::decimal("latitude", 10, 7))
            .column(ColumnSpec::decimal("longitude", 10, 7))
            .column(ColumnSpec::foreign_key("companyId", "Companies", Cascade).not_null())
            .column(ColumnSpec::foreign_key("subdistrictId", "Subdistricts", SetNull))
            .timestamps()
            .paranoid(),
    )
}
