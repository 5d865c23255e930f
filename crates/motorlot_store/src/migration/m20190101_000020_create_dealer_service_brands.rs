use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, IndexSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000020",
        "create dealer service brands",
        TableSpec::entity("DealerServiceBrands")
            .column(ColumnSpec::foreign_key("dealerId", "Dealers", Cascade).not_null())
            .column(ColumnSpec::foreign_key("brandId", "Brands", Cascade).not_null())
            .index(
                IndexSpec::new("idx_dealer_service_brands_pair", ["dealerId", "brandId"]).unique(),
            )
            .timestamps(),
    )
}
