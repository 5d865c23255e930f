use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, IndexSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000015",
        "create likes",
        TableSpec::entity("Likes")
            .column(ColumnSpec::foreign_key("carId", "Cars", Cascade).not_null())
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade).not_null())
            .index(IndexSpec::new("idx_likes_car_user", ["carId", "userId"]).unique())
            .timestamps(),
    )
}
