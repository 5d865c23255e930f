use motorlot_core::ReferentialAction::SetNull;
use motorlot_core::{ColumnSpec, MigrationUnit};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::add_column(
        "20200301000002",
        "add categoryId to cars",
        "Cars",
        ColumnSpec::foreign_key("categoryId", "Categories", SetNull),
    )
}
