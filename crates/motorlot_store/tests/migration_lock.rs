use motorlot_store::lock;
use motorlot_store::{
    ColumnSpec, MigrationConfig, MigrationUnit, MotorlotConfig, MotorlotError, MotorlotResult,
    MotorlotStore, TableSpec,
};
use tempfile::tempdir;

fn units() -> Vec<MigrationUnit> {
    vec![MigrationUnit::create_table(
        "2019-01",
        "create cars",
        TableSpec::entity("Cars").column(ColumnSpec::string("name")),
    )]
}

#[tokio::test]
async fn held_lock_rejects_a_second_runner() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = MotorlotConfig::default_sqlite(base.join("motorlot.sqlite").to_string_lossy());
    let store = MotorlotStore::connect(&config, base).await?;

    let held = lock::acquire(store.connection(), "deploy-7").await?;
    assert_eq!(held.holder(), "deploy-7");

    let runner = store.runner(units())?;
    let err = runner.apply_forward(None).await.unwrap_err();
    assert!(
        matches!(err, MotorlotError::ConcurrentMigration { ref holder } if holder == "deploy-7"),
        "{err}"
    );
    let err = runner.rollback_last(1).await.unwrap_err();
    assert!(matches!(err, MotorlotError::ConcurrentMigration { .. }));
    assert!(runner.ledger().await?.is_empty());

    held.release(store.connection()).await?;
    assert_eq!(lock::current_holder(store.connection()).await?, None);
    assert_eq!(runner.apply_forward(None).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn force_unlock_clears_a_stale_lock() -> MotorlotResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let mut config =
        MotorlotConfig::default_sqlite(base.join("motorlot.sqlite").to_string_lossy());
    config.migration = Some(MigrationConfig {
        lock_holder: Some("ci-runner".into()),
    });
    let store = MotorlotStore::connect(&config, base).await?;
    let runner = store.runner(units())?;
    assert_eq!(runner.holder(), "ci-runner");

    // A crashed run leaves its lock row behind.
    let stale = lock::acquire(store.connection(), "crashed-run").await?;
    drop(stale);
    assert_eq!(
        lock::current_holder(store.connection()).await?.as_deref(),
        Some("crashed-run")
    );
    assert!(runner.apply_forward(None).await.is_err());

    assert!(runner.force_unlock().await?);
    assert!(!runner.force_unlock().await?);
    assert_eq!(runner.apply_forward(None).await?.len(), 1);
    assert_eq!(lock::current_holder(store.connection()).await?, None);
    Ok(())
}
