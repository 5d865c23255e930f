use std::path::Path;
use std::sync::Arc;

use motorlot_store::{
    AttributeDef, ColumnSpec, EntityDef, FieldValue, MigrationUnit, ModelRegistry,
    MotorlotConfig, MotorlotError, MotorlotResult, MotorlotStore, ReadScope, ReferentialAction,
    RowStore, TableSpec, Values,
};
use sea_orm::prelude::Decimal;
use tempfile::tempdir;

async fn migrated(base: &Path) -> MotorlotResult<(MotorlotStore, RowStore)> {
    let config = MotorlotConfig::default_sqlite(base.join("motorlot.sqlite").to_string_lossy());
    let store = MotorlotStore::connect(&config, base).await?;
    store.migrate_to_latest().await?;
    let rows = store.catalog_rows()?;
    Ok((store, rows))
}

fn values<const N: usize>(pairs: [(&str, FieldValue); N]) -> Values {
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

async fn user(rows: &RowStore, email: &str) -> MotorlotResult<i64> {
    rows.insert(
        "User",
        values([
            ("name", "Seller".into()),
            ("email", email.into()),
            ("password", "hashed".into()),
        ]),
    )
    .await
}

#[tokio::test]
async fn deleting_a_user_cascades_by_each_dependents_flag() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    let seller = user(&rows, "seller@example.com").await?;
    let bidder = user(&rows, "bidder@example.com").await?;
    let car = rows
        .insert(
            "Car",
            values([
                ("name", "Avanza 1.3 G".into()),
                ("price", Decimal::new(18_500_000_000, 2).into()),
                ("userId", seller.into()),
            ]),
        )
        .await?;
    let gallery = rows
        .insert(
            "Gallery",
            values([("photo", "front.jpg".into()), ("carId", car.into())]),
        )
        .await?;
    rows.insert(
        "Bargain",
        values([
            ("price", Decimal::new(17_000_000_000, 2).into()),
            ("carId", car.into()),
            ("bidderId", bidder.into()),
        ]),
    )
    .await?;
    rows.insert("Like", values([("carId", car.into()), ("userId", bidder.into())]))
        .await?;

    let report = rows.delete("User", seller).await?;
    let soft: Vec<&str> = report
        .soft_deleted
        .iter()
        .map(|(entity, _)| entity.as_str())
        .collect();
    assert_eq!(soft[0], "User");
    for entity in ["Car", "Gallery", "Bargain"] {
        assert_eq!(
            soft.iter().filter(|name| **name == entity).count(),
            1,
            "{entity} in {soft:?}"
        );
    }
    assert_eq!(report.removed, vec![("Like".to_string(), 1)]);

    assert!(rows.find("Car", car, ReadScope::default()).await?.is_none());
    let hidden = rows
        .find("Car", car, ReadScope::IncludeDeleted)
        .await?
        .expect("soft-deleted car is still stored");
    assert!(hidden.state().is_deleted());
    assert_eq!(rows.count("Gallery", ReadScope::ExcludeDeleted).await?, 0);
    assert_eq!(rows.count("Gallery", ReadScope::IncludeDeleted).await?, 1);
    assert_eq!(rows.count("Like", ReadScope::IncludeDeleted).await?, 0);
    assert_eq!(rows.list("User", ReadScope::default()).await?.len(), 1);

    let err = rows
        .update("Gallery", gallery, values([("photo", "rear.jpg".into())]))
        .await
        .unwrap_err();
    assert!(matches!(err, MotorlotError::NotFound { .. }), "{err}");
    let err = rows.delete("User", seller).await.unwrap_err();
    assert!(matches!(err, MotorlotError::NotFound { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn restore_clears_one_row_only() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    let seller = user(&rows, "seller@example.com").await?;
    let car = rows
        .insert(
            "Car",
            values([
                ("name", "Jazz RS".into()),
                ("price", Decimal::new(21_000_000_000, 2).into()),
                ("userId", seller.into()),
            ]),
        )
        .await?;
    rows.delete("User", seller).await?;

    rows.restore("User", seller).await?;
    let restored = rows
        .find("User", seller, ReadScope::default())
        .await?
        .expect("restored user is visible");
    assert!(restored.get("deletedAt").is_some_and(FieldValue::is_null));
    assert!(rows.find("Car", car, ReadScope::default()).await?.is_none());

    let err = rows.restore("User", seller).await.unwrap_err();
    assert!(matches!(err, MotorlotError::Conflict { .. }), "{err}");
    let err = rows.restore("User", 404).await.unwrap_err();
    assert!(matches!(err, MotorlotError::NotFound { .. }), "{err}");
    let err = rows.restore("Like", 1).await.unwrap_err();
    assert!(matches!(err, MotorlotError::Validation { .. }), "{err}");

    rows.update("User", seller, values([("phone", "0812".into())]))
        .await?;
    let updated = rows.find("User", seller, ReadScope::default()).await?.unwrap();
    assert_eq!(updated.get("phone").and_then(FieldValue::as_text), Some("0812"));
    assert_eq!(
        updated.get("role").and_then(FieldValue::as_text),
        Some("customer")
    );
    Ok(())
}

#[tokio::test]
async fn non_paranoid_rows_are_removed_physically() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    let brand = rows
        .insert("Brand", values([("name", "Toyota".into())]))
        .await?;
    rows.insert(
        "Model",
        values([("name", "Avanza".into()), ("brandId", brand.into())]),
    )
    .await?;
    let report = rows.delete("Brand", brand).await?;
    assert!(report.soft_deleted.is_empty());
    assert_eq!(report.removed.len(), 2);
    assert_eq!(rows.count("Model", ReadScope::IncludeDeleted).await?, 0);
    assert!(rows.find("Brand", brand, ReadScope::IncludeDeleted).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn pages_are_ordered_by_id() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    for name in ["Black", "White", "Silver", "Grey", "Red"] {
        rows.insert("Color", values([("name", name.into())])).await?;
    }
    let (page, paging) = rows
        .find_page("Color", 2, 2, ReadScope::default())
        .await?;
    let names: Vec<&str> = page
        .iter()
        .filter_map(|row| row.get("name").and_then(FieldValue::as_text))
        .collect();
    assert_eq!(names, vec!["Silver", "Grey"]);
    assert_eq!(paging.last_page, 3);
    assert_eq!(paging.count, 5);
    Ok(())
}

#[tokio::test]
async fn cascades_terminate_on_cycles() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = MotorlotConfig::default_sqlite(base.join("motorlot.sqlite").to_string_lossy());
    let store = MotorlotStore::connect(&config, base).await?;
    let units = vec![
        MigrationUnit::create_table(
            "2019-01",
            "create as",
            TableSpec::entity("As")
                .column(ColumnSpec::integer("bId"))
                .timestamps()
                .paranoid(),
        ),
        MigrationUnit::create_table(
            "2019-02",
            "create bs",
            TableSpec::entity("Bs")
                .column(ColumnSpec::integer("aId"))
                .timestamps()
                .paranoid(),
        ),
    ];
    store.runner(units)?.apply_forward(None).await?;
    let registry = ModelRegistry::build([
        EntityDef::new("A", "As")
            .attribute(AttributeDef::integer("bId"))
            .belongs_to("B", "bId", "b", ReferentialAction::Cascade)
            .timestamps()
            .paranoid(),
        EntityDef::new("B", "Bs")
            .attribute(AttributeDef::integer("aId"))
            .belongs_to("A", "aId", "a", ReferentialAction::Cascade)
            .timestamps()
            .paranoid(),
    ])?;
    let rows = store.rows(Arc::new(registry));
    let a = rows.insert("A", Values::new()).await?;
    let b = rows.insert("B", values([("aId", a.into())])).await?;
    rows.update("A", a, values([("bId", b.into())])).await?;

    let report = rows.delete("A", a).await?;
    assert_eq!(
        report.soft_deleted,
        vec![("A".to_string(), a), ("B".to_string(), b)]
    );
    assert!(report.removed.is_empty());
    assert_eq!(rows.count("A", ReadScope::default()).await?, 0);
    assert_eq!(rows.count("B", ReadScope::default()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn lifecycle_errors_name_the_row() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    let seller = user(&rows, "seller@example.com").await?;

    let err = rows.restore("User", seller).await.unwrap_err();
    assert!(matches!(err, MotorlotError::Conflict { .. }), "{err}");
    assert!(
        err.to_string().contains(&format!("User {seller}: row is not soft-deleted")),
        "{err}"
    );

    rows.delete("User", seller).await?;
    let err = rows.delete("User", seller).await.unwrap_err();
    assert!(
        err.to_string().contains(&format!("User {seller}: row is already soft-deleted")),
        "{err}"
    );
    let err = rows
        .update("User", seller, values([("phone", "0812".into())]))
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains(&format!("User {seller}: row is soft-deleted")),
        "{err}"
    );
    let err = rows
        .update("User", 404, values([("phone", "0812".into())]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found: User 404");
    Ok(())
}

#[tokio::test]
async fn pages_past_the_end_are_empty() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let (_store, rows) = migrated(dir.path()).await?;
    rows.insert("Color", values([("name", "Black".into())])).await?;
    let (page, paging) = rows
        .find_page("Color", u64::MAX, 10, ReadScope::default())
        .await?;
    assert!(page.is_empty());
    assert_eq!(paging.count, 1);
    assert_eq!(paging.last_page, 1);
    Ok(())
}
