//! Entity definitions for the car marketplace.
//!
//! Foreign-key columns are plain integer attributes; the reference and its delete action come
//! from the association that names them. A paranoid child pointing at a non-paranoid lookup
//! uses `SetNull`, so a physical delete of the lookup never removes soft-deleted history.

use motorlot_core::ReferentialAction::{Cascade, SetNull};
use motorlot_core::{AttributeDef, DefaultValue, EntityDef, ModelRegistry, MotorlotResult};

fn text_default(value: &str) -> DefaultValue {
    DefaultValue::Text(value.to_string())
}

fn province() -> EntityDef {
    EntityDef::new("Province", "Provinces")
        .attribute(AttributeDef::string("name").not_null())
        .has_many("City", "provinceId", "cities", Cascade)
        .timestamps()
}

fn city() -> EntityDef {
    EntityDef::new("City", "Cities")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::integer("provinceId").not_null())
        .belongs_to("Province", "provinceId", "province", Cascade)
        .has_many("Subdistrict", "cityId", "subdistricts", Cascade)
        .timestamps()
}

fn subdistrict() -> EntityDef {
    EntityDef::new("Subdistrict", "Subdistricts")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::string_len("postalCode", 10))
        .attribute(AttributeDef::integer("cityId").not_null())
        .belongs_to("City", "cityId", "city", Cascade)
        .timestamps()
}

fn user() -> EntityDef {
    EntityDef::new("User", "Users")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::string("email").not_null().unique())
        .attribute(AttributeDef::string("password").not_null())
        .attribute(AttributeDef::string("phone"))
        .attribute(AttributeDef::text("address"))
        .attribute(
            AttributeDef::string("role")
                .not_null()
                .default_value(text_default("customer")),
        )
        .attribute(AttributeDef::string("avatar"))
        .attribute(AttributeDef::integer("subdistrictId"))
        .belongs_to("Subdistrict", "subdistrictId", "subdistrict", SetNull)
        .has_one("Company", "userId", "company", Cascade)
        .has_many("Car", "userId", "cars", Cascade)
        .has_many("Bargain", "bidderId", "bargains", Cascade)
        .has_many("Purchase", "buyerId", "purchases", Cascade)
        .has_many("SearchHistory", "userId", "searchHistories", Cascade)
        .has_many("CreditCardDetail", "userId", "creditCards", Cascade)
        .belongs_to_many("Car", "Like", "userId", "likedCars", Cascade)
        .belongs_to_many("Car", "View", "userId", "viewedCars", Cascade)
        .timestamps()
        .paranoid()
}

fn company() -> EntityDef {
    EntityDef::new("Company", "Companies")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::text("address"))
        .attribute(AttributeDef::string("phone"))
        .attribute(AttributeDef::integer("userId").not_null())
        .belongs_to("User", "userId", "owner", Cascade)
        .has_many("Dealer", "companyId", "dealers", Cascade)
        .timestamps()
        .paranoid()
}

fn dealer() -> EntityDef {
    EntityDef::new("Dealer", "Dealers")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::text("address"))
        .attribute(AttributeDef::string("phone"))
        .attribute(AttributeDef::time("openTime"))
        .attribute(AttributeDef::time("closeTime"))
        .attribute(AttributeDef::decimal("latitude", 10, 7))
        .attribute(AttributeDef::decimal("longitude", 10, 7))
        .attribute(AttributeDef::integer("companyId").not_null())
        .attribute(AttributeDef::integer("subdistrictId"))
        .belongs_to("Company", "companyId", "company", Cascade)
        .belongs_to("Subdistrict", "subdistrictId", "subdistrict", SetNull)
        .has_many("Car", "dealerId", "cars", SetNull)
        .belongs_to_many("Brand", "DealerBrand", "dealerId", "brands", Cascade)
        .belongs_to_many(
            "Brand",
            "DealerServiceBrand",
            "dealerId",
            "serviceBrands",
            Cascade,
        )
        .timestamps()
        .paranoid()
}

fn brand() -> EntityDef {
    EntityDef::new("Brand", "Brands")
        .attribute(AttributeDef::string("name").not_null().unique())
        .attribute(AttributeDef::string("logo"))
        .has_many("Model", "brandId", "models", Cascade)
        .belongs_to_many("Dealer", "DealerBrand", "brandId", "dealers", Cascade)
        .belongs_to_many(
            "Dealer",
            "DealerServiceBrand",
            "brandId",
            "serviceDealers",
            Cascade,
        )
        .timestamps()
}

fn car_type() -> EntityDef {
    EntityDef::new("Type", "Types")
        .attribute(AttributeDef::string("name").not_null().unique())
        .timestamps()
}

fn color() -> EntityDef {
    EntityDef::new("Color", "Colors")
        .attribute(AttributeDef::string("name").not_null().unique())
        .attribute(AttributeDef::string_len("hex", 7))
        .timestamps()
}

fn model() -> EntityDef {
    EntityDef::new("Model", "Models")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::integer("brandId").not_null())
        .attribute(AttributeDef::integer("typeId"))
        .belongs_to("Brand", "brandId", "brand", Cascade)
        .belongs_to("Type", "typeId", "type", SetNull)
        .timestamps()
}

fn category() -> EntityDef {
    EntityDef::new("Category", "Categories")
        .attribute(AttributeDef::string("name").not_null().unique())
        .attribute(AttributeDef::text("description"))
        .has_many("Car", "categoryId", "cars", SetNull)
        .timestamps()
}

fn car() -> EntityDef {
    EntityDef::new("Car", "Cars")
        .attribute(AttributeDef::string("name").not_null())
        .attribute(AttributeDef::decimal("price", 15, 2).not_null())
        .attribute(AttributeDef::integer("year"))
        .attribute(AttributeDef::integer("mileage"))
        .attribute(AttributeDef::string("transmission"))
        .attribute(AttributeDef::string("fuel"))
        .attribute(AttributeDef::text("description"))
        .attribute(
            AttributeDef::string("status")
                .not_null()
                .default_value(text_default("available")),
        )
        .attribute(
            AttributeDef::boolean("isNew")
                .not_null()
                .default_value(DefaultValue::Boolean(false)),
        )
        .attribute(AttributeDef::integer("userId").not_null())
        .attribute(AttributeDef::integer("brandId"))
        .attribute(AttributeDef::integer("modelId"))
        .attribute(AttributeDef::integer("typeId"))
        .attribute(AttributeDef::integer("colorId"))
        .attribute(AttributeDef::integer("dealerId"))
        .attribute(AttributeDef::integer("categoryId"))
        .belongs_to("User", "userId", "seller", Cascade)
        .belongs_to("Brand", "brandId", "brand", SetNull)
        .belongs_to("Model", "modelId", "model", SetNull)
        .belongs_to("Type", "typeId", "type", SetNull)
        .belongs_to("Color", "colorId", "color", SetNull)
        .belongs_to("Dealer", "dealerId", "dealer", SetNull)
        .belongs_to("Category", "categoryId", "category", SetNull)
        .has_many("Gallery", "carId", "galleries", Cascade)
        .has_many("Bargain", "carId", "bargains", Cascade)
        .has_many("Purchase", "carId", "purchases", Cascade)
        .belongs_to_many("User", "Like", "carId", "likers", Cascade)
        .belongs_to_many("User", "View", "carId", "viewers", Cascade)
        .timestamps()
        .paranoid()
}

fn gallery() -> EntityDef {
    EntityDef::new("Gallery", "Galleries")
        .attribute(AttributeDef::string("photo").not_null())
        .attribute(
            AttributeDef::boolean("isPrimary")
                .not_null()
                .default_value(DefaultValue::Boolean(false)),
        )
        .attribute(AttributeDef::integer("carId").not_null())
        .belongs_to("Car", "carId", "car", Cascade)
        .timestamps()
        .paranoid()
}

fn bargain() -> EntityDef {
    EntityDef::new("Bargain", "Bargains")
        .attribute(AttributeDef::decimal("price", 15, 2).not_null())
        .attribute(
            AttributeDef::string("status")
                .not_null()
                .default_value(text_default("pending")),
        )
        .attribute(AttributeDef::integer("carId").not_null())
        .attribute(AttributeDef::integer("bidderId").not_null())
        .belongs_to("Car", "carId", "car", Cascade)
        .belongs_to("User", "bidderId", "bidder", Cascade)
        .timestamps()
        .paranoid()
}

fn purchase() -> EntityDef {
    EntityDef::new("Purchase", "Purchases")
        .attribute(AttributeDef::decimal("price", 15, 2).not_null())
        .attribute(AttributeDef::timestamp("paidAt"))
        .attribute(AttributeDef::integer("carId").not_null())
        .attribute(AttributeDef::integer("buyerId").not_null())
        .belongs_to("Car", "carId", "car", Cascade)
        .belongs_to("User", "buyerId", "buyer", Cascade)
        .timestamps()
        .paranoid()
}

fn like() -> EntityDef {
    EntityDef::new("Like", "Likes")
        .attribute(AttributeDef::integer("carId").not_null())
        .attribute(AttributeDef::integer("userId").not_null())
        .timestamps()
}

fn view() -> EntityDef {
    EntityDef::new("View", "Views")
        .attribute(AttributeDef::integer("carId").not_null())
        .attribute(AttributeDef::integer("userId"))
        .timestamps()
}

fn search_history() -> EntityDef {
    EntityDef::new("SearchHistory", "SearchHistories")
        .attribute(AttributeDef::string("keyword").not_null())
        .attribute(AttributeDef::integer("userId").not_null())
        .belongs_to("User", "userId", "user", Cascade)
        .timestamps()
}

fn credit_card_detail() -> EntityDef {
    EntityDef::new("CreditCardDetail", "CreditCardDetails")
        .attribute(AttributeDef::string("holderName").not_null())
        .attribute(AttributeDef::string_len("cardNumber", 19).not_null())
        .attribute(AttributeDef::string_len("expiry", 5).not_null())
        .attribute(AttributeDef::integer("userId").not_null())
        .belongs_to("User", "userId", "owner", Cascade)
        .timestamps()
        .paranoid()
}

fn dealer_brand() -> EntityDef {
    EntityDef::new("DealerBrand", "DealerBrands")
        .attribute(AttributeDef::integer("dealerId").not_null())
        .attribute(AttributeDef::integer("brandId").not_null())
        .timestamps()
}

fn dealer_service_brand() -> EntityDef {
    EntityDef::new("DealerServiceBrand", "DealerServiceBrands")
        .attribute(AttributeDef::integer("dealerId").not_null())
        .attribute(AttributeDef::integer("brandId").not_null())
        .timestamps()
}

pub fn entities() -> Vec<EntityDef> {
    vec![
        province(),
        city(),
        subdistrict(),
        user(),
        company(),
        dealer(),
        brand(),
        car_type(),
        color(),
        model(),
        category(),
        car(),
        gallery(),
        bargain(),
        purchase(),
        like(),
        view(),
        search_history(),
        credit_card_detail(),
        dealer_brand(),
        dealer_service_brand(),
    ]
}

/// Registry over every marketplace entity, associations resolved.
pub fn registry() -> MotorlotResult<ModelRegistry> {
    ModelRegistry::build(entities())
}
