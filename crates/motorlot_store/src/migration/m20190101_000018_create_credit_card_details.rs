use motorlot_core::ReferentialAction::Cascade;
use motorlot_core::{ColumnSpec, MigrationUnit, TableSpec};

pub(crate) fn unit() -> MigrationUnit {
    MigrationUnit::create_table(
        "20190101000018",
        "create credit card details",
        TableSpec::entity("CreditCardDetails")
            .column(ColumnSpec::string("holderName").not_null())
            .column(ColumnSpec::string_len("cardNumber", 19).not_null())
            .column(ColumnSpec::string_len("expiry", 5).not_null())
            .column(ColumnSpec::foreign_key("userId", "Users", Cascade).not_null())
            .timestamps()
            .paranoid(),
    )
}
