use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000005",
        "create companies",
        TableSpec::entity("Companies")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::text("address"))
            .column(ColumnSpec::string("phone"))
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade).not_null())
            .timestamps()
            .paranoid(),
    )
}
