use motorlot_core::ReferentialAction::SetNull;
use motorlot_core::{ColumnSpec, DefaultValue, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000004",
        "create users",
        TableSpec::entity("Users")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::string("email").not_null().unique())
            .column(ColumnSpec::string("password").not_null())
            .column(ColumnSpec::string("phone"))
            .column(ColumnSpec::text("address"))
            .column(
                ColumnSpec::string("role")
                    .not_null()
                    .default_value(DefaultValue::Text("customer".into())),
            )
            .column(ColumnSpec::string("avatar"))
            // Renamed to subdistrictId in 20200310000001.
            .column(ColumnSpec::foreign_key("subDistictId", "Subdistricts", SetNull))
            .timestamps()
            .paranoid(),
    )
}
