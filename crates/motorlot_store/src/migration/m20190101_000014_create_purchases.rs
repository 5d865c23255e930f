use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000014",
        "create purchases",
        TableSpec::entity("Purchases")
            .column(ColumnSpec::decimal("price", 15, 2).not_null())
            .column(ColumnSpec::timestamp("paidAt"))
            .column(ColumnSpec::foreign_key("carId", "Cars", Cascade).not_null())
            .column(ColumnSpec::foreign_key("buyerId", "Users", Cascade).not_null())
            .timestamps()
            .paranoid(),
    )
}
