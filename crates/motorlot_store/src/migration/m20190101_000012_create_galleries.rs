use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, DefaultValue, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000012",
        "create galleries",
        TableSpec::entity("Galleries")
            .column(ColumnSpec::string("photo").not_null())
            .column(
                ColumnSpec::boolean("isPrimary")
                    .not_null()
                    .default_value(DefaultValue::Boolean(false)),
            )
            .column(ColumnSpec::foreign_key("carId", "Cars", Cascade).not_null())
            .timestamps()
            .paranoid(),
    )
}
