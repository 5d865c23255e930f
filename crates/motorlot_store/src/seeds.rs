//! Reference data loaded after the structural migrations.

use crate::seed::{Seed, SeedRow};
use motorlot_core::{MotorlotResult, hash_password};

pub const SEED_NAMES: [&str; 5] = ["types", "colors", "categories", "provinces", "operators"];

fn named(seed: &str, table: &str, names: &[&str]) -> Seed {
    names
        .iter()
        .zip(1_i64..)
        .fold(Seed::new(seed, table), |seed, (name, id)| {
            seed.row(SeedRow::new(id).with("name", *name))
        })
}

pub fn types() -> Seed {
    named(
        "types",
        "Types",
        &["Sedan", "Hatchback", "SUV", "MPV", "Pickup", "Coupe"],
    )
}

pub fn colors() -> Seed {
    [
        ("Black", "#000000"),
        ("White", "#FFFFFF"),
        ("Silver", "#C0C0C0"),
        ("Grey", "#808080"),
        ("Red", "#C0392B"),
        ("Blue", "#1F4E9E"),
    ]
    .into_iter()
    .zip(1_i64..)
    .fold(Seed::new("colors", "Colors"), |seed, ((name, hex), id)| {
        seed.row(SeedRow::new(id).with("name", name).with("hex", hex))
    })
}

pub fn categories() -> Seed {
    [
        ("New", "Unregistered cars sold by dealers"),
        ("Used", "Second-hand cars from any seller"),
        ("Certified", "Used cars inspected by a dealer"),
    ]
    .into_iter()
    .zip(1_i64..)
    .fold(
        Seed::new("categories", "Categories"),
        |seed, ((name, description), id)| {
            seed.row(
                SeedRow::new(id)
                    .with("name", name)
                    .with("description", description),
            )
        },
    )
}

pub fn provinces() -> Seed {
    named(
        "provinces",
        "Provinces",
        &[
            "DKI Jakarta",
            "Jawa Barat",
            "Jawa Tengah",
            "Jawa Timur",
            "Banten",
            "DI Yogyakarta",
            "Bali",
        ],
    )
}

/// Back-office account. The secret is hashed when the seed is built.
pub fn operators(secret: &str) -> MotorlotResult<Seed> {
    let row = SeedRow::new(1)
        .with("name", "Operator")
        .with("email", "operator@motorlot.local")
        .with("password", hash_password(secret)?)
        .with("role", "admin");
    Ok(Seed::new("operators", "Users").row(row))
}

/// Every seed in load order.
pub fn catalog(operator_secret: &str) -> MotorlotResult<Vec<Seed>> {
    Ok(vec![
        types(),
        colors(),
        categories(),
        provinces(),
        operators(operator_secret)?,
    ])
}

pub fn find(name: &str, operator_secret: &str) -> MotorlotResult<Option<Seed>> {
    let seed = match name {
        "types" => types(),
        "colors" => colors(),
        "categories" => categories(),
        "provinces" => provinces(),
        "operators" => operators(operator_secret)?,
        _ => return Ok(None),
    };
    Ok(Some(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::verify_password;

    #[test]
    fn catalog_matches_seed_names() {
        let catalog = catalog("secret").unwrap();
        let names: Vec<&str> = catalog.iter().map(|seed| seed.name.as_str()).collect();
        assert_eq!(names, SEED_NAMES);
        for seed in &catalog {
            let mut ids: Vec<i64> = seed.rows.iter().map(|row| row.id).collect();
            ids.dedup();
            assert_eq!(ids.len(), seed.rows.len(), "{} repeats an id", seed.name);
        }
    }

    #[test]
    fn operator_password_is_hashed() {
        let seed = operators("letmein").unwrap();
        let stored = seed.rows[0].values["password"].as_text().unwrap().to_string();
        assert_ne!(stored, "letmein");
        assert!(verify_password("letmein", &stored));
    }

    #[test]
    fn unknown_seed_is_none() {
        assert!(find("brands", "secret").unwrap().is_none());
        assert_eq!(find("colors", "secret").unwrap().unwrap().rows.len(), 6);
    }
}
