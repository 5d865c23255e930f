use motorlot_store::{SchemaShape, migration, models};

#[test]
fn catalog_reaches_the_registry_shape() {
    let registry = models::registry().expect("registry resolves");
    let mut applied = SchemaShape::new();
    applied
        .apply_all(&migration::catalog())
        .expect("catalog applies");
    let target = registry.target_shape().expect("target shape");

    let applied = applied.column_layout();
    let target = target.column_layout();
    let applied_tables: Vec<&String> = applied.keys().collect();
    let target_tables: Vec<&String> = target.keys().collect();
    assert_eq!(applied_tables, target_tables);
    for (table, columns) in &target {
        let migrated = &applied[table];
        for (name, column) in columns {
            assert_eq!(
                migrated.get(name),
                Some(column),
                "{table}.{name} differs between catalog and models"
            );
        }
        assert_eq!(migrated.len(), columns.len(), "{table} has extra columns");
    }
}

#[test]
fn every_entity_maps_to_a_migrated_table() {
    let registry = models::registry().expect("registry resolves");
    let mut applied = SchemaShape::new();
    applied.apply_all(&migration::catalog()).unwrap();
    for entity in registry.entities() {
        assert!(
            applied.has_table(&entity.table),
            "{} has no table {}",
            entity.name,
            entity.table
        );
        if entity.paranoid {
            assert!(applied.has_column(&entity.table, "deletedAt"));
        }
    }
    assert_eq!(registry.len(), applied.tables.len());
}
