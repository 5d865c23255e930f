use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, IndexSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000017",
        "create search histories",
        TableSpec::entity("SearchHistories")
            .column(ColumnSpec::string("keyword").not_null())
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade).not_null())
            .index(IndexSpec::new("idx_search_histories_user", ["userId"]))
            .timestamps(),
    )
}
