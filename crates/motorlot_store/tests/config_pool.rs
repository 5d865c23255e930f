use motorlot_store::{
    DEFAULT_SQLITE_NAME, DatabaseConfig, MotorlotConfig, MotorlotError, MotorlotStore,
};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn deserializes_pool_and_migration_settings() {
    let payload = json!({
        "database": { "backend": "sqlite", "path": "data.sqlite" },
        "pool": {
            "max_connections": 4,
            "min_connections": 1,
            "connect_timeout_ms": 1000,
            "acquire_timeout_ms": 500,
            "idle_timeout_ms": 60000
        },
        "migration": { "lock_holder": "release-42" },
        "failpoints": ["migrate:20200301000002"]
    });
    let config: MotorlotConfig = serde_json::from_value(payload).expect("config");
    match &config.database {
        DatabaseConfig::Sqlite { path } => {
            assert_eq!(path.as_deref(), Some("data.sqlite"));
        }
        _ => panic!("expected sqlite backend"),
    }
    let pool = config.pool.as_ref().expect("pool");
    assert_eq!(pool.max_connections, Some(4));
    assert_eq!(pool.min_connections, Some(1));
    assert_eq!(pool.connect_timeout_ms, Some(1000));
    assert_eq!(pool.acquire_timeout_ms, Some(500));
    assert_eq!(pool.idle_timeout_ms, Some(60000));
    assert_eq!(config.lock_holder(), Some("release-42"));
    assert_eq!(
        config.failpoints.as_deref(),
        Some(&["migrate:20200301000002".to_string()][..])
    );
}

#[test]
fn postgres_config_carries_its_url() {
    let payload = json!({
        "database": { "backend": "postgres", "url": "postgres://motorlot@localhost/motorlot" }
    });
    let config: MotorlotConfig = serde_json::from_value(payload).expect("config");
    assert_eq!(config.backend_name(), "postgres");
    assert_eq!(
        config.connection_url(),
        Some("postgres://motorlot@localhost/motorlot")
    );
    assert!(config.pool.is_none());
    assert!(config.lock_holder().is_none());
    assert!(config.sqlite_path(std::path::Path::new(".")).is_err());
}

#[test]
fn existing_config_file_is_reused() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let payload = json!({
        "database": { "backend": "sqlite", "path": "custom.sqlite" }
    });
    std::fs::write(base.join("motorlot.json"), payload.to_string()).expect("write config");
    let config = MotorlotConfig::load_or_init(base).expect("config");
    assert_eq!(
        config.sqlite_path(base).expect("sqlite path"),
        base.join("custom.sqlite")
    );
}

#[tokio::test]
async fn open_writes_a_relocatable_default_config() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path().join("datastore");
    let store = MotorlotStore::open(&base).await.expect("open store");
    assert!(store.capabilities().transactional_ddl);
    assert!(store.lock_holder().starts_with("pid-"));
    assert!(base.join(DEFAULT_SQLITE_NAME).exists());

    let raw = std::fs::read_to_string(base.join("motorlot.json")).expect("config file");
    let written: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(
        written["database"],
        json!({ "backend": "sqlite", "path": DEFAULT_SQLITE_NAME })
    );
}

#[test]
fn unknown_failpoints_and_blank_settings_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let payload = json!({
        "database": { "backend": "sqlite" },
        "failpoints": ["migrate:2019-01", "seed:"]
    });
    std::fs::write(base.join("motorlot.json"), payload.to_string()).expect("write config");
    let err = MotorlotConfig::load_or_init(base).unwrap_err();
    assert!(matches!(err, MotorlotError::Validation { .. }), "{err}");
    assert!(err.to_string().contains("seed:"), "{err}");

    let blank_holder: MotorlotConfig = serde_json::from_value(json!({
        "database": { "backend": "sqlite" },
        "migration": { "lock_holder": "  " }
    }))
    .expect("config");
    assert!(blank_holder.validate().is_err());

    let blank_url: MotorlotConfig = serde_json::from_value(json!({
        "database": { "backend": "mysql", "url": "" }
    }))
    .expect("config");
    assert!(blank_url.validate().is_err());

    let accepted: MotorlotConfig = serde_json::from_value(json!({
        "database": { "backend": "sqlite" },
        "migration": { "lock_holder": "deploy-7" },
        "failpoints": ["migrate:2019-01", "rollback:2019-01", "seed:colors"]
    }))
    .expect("config");
    accepted.validate().expect("valid config");
    assert_eq!(accepted.resolved_lock_holder(), "deploy-7");
    assert_eq!(
        accepted.sqlite_path(base).expect("sqlite path"),
        base.join(DEFAULT_SQLITE_NAME)
    );
}
