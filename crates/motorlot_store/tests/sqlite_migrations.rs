use std::collections::HashSet;
use std::path::Path;

use motorlot_store::{
    ColumnSpec, MigrationUnit, MotorlotConfig, MotorlotError, MotorlotResult, MotorlotStore,
    TableSpec, Version,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;

async fn open(base: &Path) -> MotorlotResult<MotorlotStore> {
    let config = MotorlotConfig::default_sqlite(base.join("motorlot.sqlite").to_string_lossy());
    MotorlotStore::connect(&config, base).await
}

async fn names(store: &MotorlotStore, sql: &str) -> MotorlotResult<HashSet<String>> {
    let rows = store
        .connection()
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await
        .map_err(MotorlotError::from)?;
    let mut names = HashSet::new();
    for row in rows {
        let name: String = row.try_get("", "name").map_err(MotorlotError::from)?;
        names.insert(name);
    }
    Ok(names)
}

async fn list_tables(store: &MotorlotStore) -> MotorlotResult<HashSet<String>> {
    names(store, "SELECT name FROM sqlite_master WHERE type = 'table'").await
}

async fn list_columns(store: &MotorlotStore, table: &str) -> MotorlotResult<HashSet<String>> {
    names(store, &format!("PRAGMA table_info(\"{table}\")")).await
}

fn cars_then_category() -> Vec<MigrationUnit> {
    vec![
        MigrationUnit::create_table(
            "2019-01",
            "create cars",
            TableSpec::entity("Cars")
                .column(ColumnSpec::string("name").not_null())
                .timestamps()
                .paranoid(),
        ),
        MigrationUnit::add_column(
            "2020-03",
            "add categoryId to cars",
            "Cars",
            ColumnSpec::integer("categoryId"),
        ),
    ]
}

#[tokio::test]
async fn catalog_creates_every_entity_table() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let applied = store.migrate_to_latest().await?;
    assert_eq!(applied.len(), store.catalog_runner()?.units().len());

    let tables = list_tables(&store).await?;
    for table in [
        "motorlot_schema_migrations",
        "motorlot_migration_lock",
        "Provinces",
        "Cities",
        "Subdistricts",
        "Users",
        "Companies",
        "Dealers",
        "Brands",
        "Types",
        "Colors",
        "Models",
        "Cars",
        "Galleries",
        "Bargains",
        "Purchases",
        "Likes",
        "Views",
        "SearchHistories",
        "CreditCardDetails",
        "DealerBrands",
        "DealerServiceBrands",
        "Categories",
    ] {
        assert!(tables.contains(table), "expected table '{table}' to exist");
    }
    let users = list_columns(&store, "Users").await?;
    assert!(users.contains("subdistrictId"));
    assert!(!users.contains("subDistictId"));
    assert!(list_columns(&store, "Cars").await?.contains("categoryId"));

    assert!(store.catalog_runner()?.pending().await?.is_empty());
    // Idempotency check.
    assert!(store.migrate_to_latest().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn rollback_removes_the_latest_column_only() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let runner = store.runner(cars_then_category())?;
    let applied = runner.apply_forward(None).await?;
    assert_eq!(applied, vec![Version::from("2019-01"), Version::from("2020-03")]);
    assert!(list_columns(&store, "Cars").await?.contains("categoryId"));

    let rolled_back = runner.rollback_last(1).await?;
    assert_eq!(rolled_back, vec![Version::from("2020-03")]);
    assert!(list_tables(&store).await?.contains("Cars"));
    let columns = list_columns(&store, "Cars").await?;
    assert!(!columns.contains("categoryId"));
    assert!(columns.contains("deletedAt"));

    let ledger = runner.ledger().await?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].version.as_str(), "2019-01");
    let pending = runner.pending().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].version.as_str(), "2020-03");
    Ok(())
}

#[tokio::test]
async fn apply_forward_stops_at_target_version() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let runner = store.runner(cars_then_category())?;
    let applied = runner.apply_forward(Some(&Version::from("2019-01"))).await?;
    assert_eq!(applied, vec![Version::from("2019-01")]);
    assert!(!list_columns(&store, "Cars").await?.contains("categoryId"));

    let status = runner.status().await?;
    assert_eq!(status.len(), 2);
    assert!(status[0].applied_at.is_some());
    assert!(status[1].applied_at.is_none());

    let err = runner
        .apply_forward(Some(&Version::from("2021-01")))
        .await
        .unwrap_err();
    assert!(matches!(err, MotorlotError::Validation { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn rollback_follows_application_order() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    store.runner(cars_then_category())?.apply_forward(None).await?;

    // A unit merged late with an older version is applied after 2020-03.
    let mut units = cars_then_category();
    units.push(MigrationUnit::create_table(
        "2019-06",
        "create colors",
        TableSpec::entity("Colors").column(ColumnSpec::string("name")),
    ));
    let runner = store.runner(units)?;
    assert_eq!(
        runner.apply_forward(None).await?,
        vec![Version::from("2019-06")]
    );

    let rolled_back = runner.rollback_last(2).await?;
    assert_eq!(
        rolled_back,
        vec![Version::from("2019-06"), Version::from("2020-03")]
    );
    assert!(!list_tables(&store).await?.contains("Colors"));
    let remaining: Vec<String> = runner
        .ledger()
        .await?
        .into_iter()
        .map(|entry| entry.version.as_str().to_string())
        .collect();
    assert_eq!(remaining, vec!["2019-01".to_string()]);
    Ok(())
}

#[tokio::test]
async fn full_catalog_rolls_back_to_an_empty_schema() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let runner = store.catalog_runner()?;
    let total = runner.apply_forward(None).await?.len();
    let rolled_back = runner.rollback_last(total).await?;
    assert_eq!(rolled_back.len(), total);
    let tables = list_tables(&store).await?;
    assert!(!tables.contains("Users"));
    assert!(!tables.contains("Cars"));
    assert!(runner.ledger().await?.is_empty());
    Ok(())
}
