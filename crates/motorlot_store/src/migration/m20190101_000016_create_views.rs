use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000016",
        "create views",
        TableSpec::entity("Views")
            .column(ColumnSpec::foreign_key("carId", "Cars", Cascade).not_null())
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade))
            .timestamps(),
    )
}
