use motorlot_core::MigrationUnit;

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::rename_column(
        "20200310000001",
        "fix subdistrictId spelling on users",
        "Users",
        "subDistictId",
        "subdistrictId",
    )
}
