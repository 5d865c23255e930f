use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, DefaultValue, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000013",
        "create bargains",
        TableSpec::entity("Bargains")
            .column(ColumnSpec::decimal("price", 15, 2).not_null())
            .column(
                ColumnSpec::string("status")
                    .not_null()
                    .default_value(DefaultValue::Text("pending".into())),
            )
            .column(ColumnSpec::foreign_key("carId", "Cars", Cascade).not_null())
            .column(ColumnSpec::foreign_key("bidderId", "Users", Cascade).not_null())
            .timestamps()
            .paranoid(),
    )
}
