//! Migration catalog for the car marketplace schema, oldest first.

use motorlot_core::MigrationUnit;

mod m20190101_000001_create_provinces;
mod m20190101_000002_create_cities;
mod m20190101_000003_create_subdistricts;
mod m20190101_000004_create_users;
mod m20190101_000005_create_companies;
mod m20190101_000006_create_dealers;
mod m20190101_000007_create_brands;
mod m20190101_000008_create_types;
mod m20190101_000009_create_colors;
mod m20190101_000010_create_models;
mod m20190101_000011_create_cars;
mod m20190101_000012_create_galleries;
mod m20190101_000013_create_bargains;
mod m20190101_000014_create_purchases;
mod m20190101_000015_create_likes;
mod m20190101_000016_create_views;
mod m20190101_000017_create_search_histories;
mod m20190101_000018_create_credit_card_details;
mod m20190101_000019_create_dealer_brands;
mod m20190101_000020_create_dealer_service_brands;
mod m20200301_000001_create_categories;
mod m20200301_000002_add_category_to_cars;
mod m20200310_000001_rename_users_subdistrict;

pub fn catalog() -> Vec<MigrationUnit> {
    vec![
        m20190101_000001_create_provinces::unit(),
        m20190101_000002_create_cities::unit(),
        m20190101_000003_create_subdistricts::unit(),
        m20190101_000004_create_users::unit(),
        m20190101_000005_create_companies::unit(),
        m20190101_000006_create_dealers::unit(),
        m20190101_000007_create_brands::unit(),
        m20190101_000008_create_types::unit(),
        m20190101_000009_create_colors::unit(),
        m20190101_000010_create_models::unit(),
        m20190101_000011_create_cars::unit(),
        m20190101_000012_create_galleries::unit(),
        m20190101_000013_create_bargains::unit(),
        m20190101_000014_create_purchases::unit(),
        m20190101_000015_create_likes::unit(),
        m20190101_000016_create_views::unit(),
        m20190101_000017_create_search_histories::unit(),
        m20190101_000018_create_credit_card_details::unit(),
        m20190101_000019_create_dealer_brands::unit(),
        m20190101_000020_create_dealer_service_brands::unit(),
        m20200301_000001_create_categories::unit(),
        m20200301_000002_add_category_to_cars::unit(),
        m20200310_000001_rename_users_subdistrict::unit(),
    ]
}
