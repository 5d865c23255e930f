use motorlot_core::ReferentialAction::{Cascade, SetNull};
use motorlot_core::{ColumnSpec, DefaultValue, IndexSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000011",
        "create cars",
        TableSpec::entity("Cars")
            .column(ColumnSpec::string("name").not_null())
            .column(ColumnSpec::decimal("price", 15, 2).not_null())
            .column(ColumnSpec::integer("year"))
            .column(ColumnSpec::integer("mileage"))
            .column(ColumnSpec::string("transmission"))
            .column(ColumnSpec::string("fuel"))
            .column(ColumnSpec::text("description"))
            .column(
                ColumnSpec::string("status")
                    .not_null()
                    .default_value(DefaultValue::Text("available".into())),
            )
            .column(
                ColumnSpec::boolean("isNew")
                    .not_null()
                    .default_value(DefaultValue::Boolean(false)),
            )
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade).not_null())
            .column(ColumnSpec::foreign_key("brandId", "Brands", SetNull))
            .column(ColumnSpec::foreign_key("modelId", "Models", SetNull))
            .column(ColumnSpec::foreign_key("typeId", "Types", SetNull))
            .column(ColumnSpec::foreign_key("colorId", "Colors", SetNull))
            .column(ColumnSpec::foreign_key("dealerId", "Dealers", SetNull))
            .index(IndexSpec::new("idx_cars_status", ["status"]))
            .timestamps()
            .paranoid(),
    )
}
