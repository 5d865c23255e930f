//! Entity model registry.
//!
//! Entities are registered as plain data first and their associations are resolved in a
//! second pass, so definitions can reference each other in any order. The registry derives
//! the cascade graph used by soft deletes and the table shape the migrations must reach.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::change::SchemaChange;
use crate::schema::{
    ColumnSpec, ColumnType, DefaultValue, ForeignKeySpec, ReferentialAction, TableSpec,
};
use crate::shape::SchemaShape;
use crate::{MotorlotError, MotorlotResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub unique: bool,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            unique: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String { length: Some(255) })
    }

    pub fn string_len(name: impl Into<String>, length: u32) -> Self {
        Self::new(
            name,
            ColumnType::String {
                length: Some(length),
            },
        )
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn decimal(name: impl Into<String>, precision: u32, scale: u32) -> Self {
        Self::new(name, ColumnType::Decimal { precision, scale })
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Time)
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    fn to_column(&self, references: Option<ForeignKeySpec>) -> ColumnSpec {
        ColumnSpec {
            name: self.name.clone(),
            column_type: self.column_type,
            nullable: self.nullable,
            default: self.default.clone(),
            unique: self.unique,
            primary_key: false,
            auto_increment: false,
            references,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany { through: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDef {
    pub kind: AssociationKind,
    /// Target entity name.
    pub target: String,
    pub foreign_key: String,
    pub alias: String,
    pub on_delete: ReferentialAction,
}

impl AssociationDef {
    /// Entity whose table carries the foreign key column.
    pub fn holder<'a>(&'a self, declaring: &'a str) -> &'a str {
        match &self.kind {
            AssociationKind::BelongsTo => declaring,
            AssociationKind::HasOne | AssociationKind::HasMany => &self.target,
            AssociationKind::BelongsToMany { through } => through,
        }
    }

    /// Entity the foreign key points at.
    pub fn referenced<'a>(&'a self, declaring: &'a str) -> &'a str {
        match &self.kind {
            AssociationKind::BelongsTo => &self.target,
            _ => declaring,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub table: String,
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub associations: Vec<AssociationDef>,
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default)]
    pub paranoid: bool,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            attributes: Vec::new(),
            associations: Vec::new(),
            timestamps: false,
            paranoid: false,
        }
    }

    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn paranoid(mut self) -> Self {
        self.paranoid = true;
        self
    }

    pub fn association(mut self, association: AssociationDef) -> Self {
        self.associations.push(association);
        self
    }

    pub fn belongs_to(
        self,
        target: &str,
        foreign_key: &str,
        alias: &str,
        on_delete: ReferentialAction,
    ) -> Self {
        self.association(AssociationDef {
            kind: AssociationKind::BelongsTo,
            target: target.to_string(),
            foreign_key: foreign_key.to_string(),
            alias: alias.to_string(),
            on_delete,
        })
    }

    pub fn has_one(
        self,
        target: &str,
        foreign_key: &str,
        alias: &str,
        on_delete: ReferentialAction,
    ) -> Self {
        self.association(AssociationDef {
            kind: AssociationKind::HasOne,
            target: target.to_string(),
            foreign_key: foreign_key.to_string(),
            alias: alias.to_string(),
            on_delete,
        })
    }

    pub fn has_many(
        self,
        target: &str,
        foreign_key: &str,
        alias: &str,
        on_delete: ReferentialAction,
    ) -> Self {
        self.association(AssociationDef {
            kind: AssociationKind::HasMany,
            target: target.to_string(),
            foreign_key: foreign_key.to_string(),
            alias: alias.to_string(),
            on_delete,
        })
    }

    pub fn belongs_to_many(
        self,
        target: &str,
        through: &str,
        foreign_key: &str,
        alias: &str,
        on_delete: ReferentialAction,
    ) -> Self {
        self.association(AssociationDef {
            kind: AssociationKind::BelongsToMany {
                through: through.to_string(),
            },
            target: target.to_string(),
            foreign_key: foreign_key.to_string(),
            alias: alias.to_string(),
            on_delete,
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute.name == name)
    }
}

/// A dependent reached when a row of some entity is deleted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CascadeEdge {
    pub dependent: String,
    pub foreign_key: String,
}

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    entities: BTreeMap<String, EntityDef>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: EntityDef) -> MotorlotResult<()> {
        if self.entities.contains_key(&entity.name) {
            return Err(MotorlotError::duplicate_entity(entity.name));
        }
        if let Some(existing) = self.entities.values().find(|def| def.table == entity.table) {
            return Err(MotorlotError::invalid(format!(
                "entities '{}' and '{}' both map to table '{}'",
                existing.name, entity.name, entity.table
            )));
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Registers every definition, then resolves associations.
    pub fn build(entities: impl IntoIterator<Item = EntityDef>) -> MotorlotResult<Self> {
        let mut registry = Self::new();
        for entity in entities {
            registry.register(entity)?;
        }
        registry.resolve_associations()?;
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    pub fn entity(&self, name: &str) -> MotorlotResult<&EntityDef> {
        self.get(name)
            .ok_or_else(|| MotorlotError::not_found(format!("entity '{name}'")))
    }

    pub fn by_table(&self, table: &str) -> Option<&EntityDef> {
        self.entities.values().find(|entity| entity.table == table)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Checks every association against the registered entities and reports all failures
    /// in a single error.
    pub fn resolve_associations(&self) -> MotorlotResult<()> {
        let mut unresolved = Vec::new();
        let mut derived: BTreeMap<(String, String), (ForeignKeySpec, String)> = BTreeMap::new();
        for entity in self.entities.values() {
            for association in &entity.associations {
                let label = format!("{}.{}", entity.name, association.alias);
                if !self.entities.contains_key(&association.target) {
                    unresolved.push(format!(
                        "{label}: target entity '{}' is not registered",
                        association.target
                    ));
                    continue;
                }
                if let AssociationKind::BelongsToMany { through } = &association.kind {
                    if !self.entities.contains_key(through) {
                        unresolved.push(format!(
                            "{label}: join entity '{through}' is not registered"
                        ));
                        continue;
                    }
                }
                let holder = association.holder(&entity.name);
                let Some(holder_def) = self.entities.get(holder) else {
                    continue;
                };
                if !holder_def.has_attribute(&association.foreign_key) {
                    unresolved.push(format!(
                        "{label}: foreign key '{}' is not an attribute of '{holder}'",
                        association.foreign_key
                    ));
                    continue;
                }
                if let Some(reference) = self.reference_for(&entity.name, association) {
                    let key = (holder.to_string(), association.foreign_key.clone());
                    match derived.get(&key) {
                        Some((existing, source)) if *existing != reference => {
                            unresolved.push(format!(
                                "{label}: {}.{} conflicts with the reference declared by {source}",
                                holder, association.foreign_key
                            ));
                        }
                        Some(_) => {}
                        None => {
                            derived.insert(key, (reference, label));
                        }
                    }
                }
            }
        }
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(MotorlotError::DanglingReference { unresolved })
        }
    }

    fn reference_for(&self, declaring: &str, association: &AssociationDef) -> Option<ForeignKeySpec> {
        let referenced = self.entities.get(association.referenced(declaring))?;
        Some(ForeignKeySpec::to_id(
            referenced.table.clone(),
            association.on_delete,
        ))
    }

    /// Direct dependents removed or soft-deleted along with a row of `entity`.
    pub fn cascade_edges(&self, entity: &str) -> Vec<CascadeEdge> {
        let mut edges = BTreeSet::new();
        for declaring in self.entities.values() {
            for association in &declaring.associations {
                if association.on_delete != ReferentialAction::Cascade {
                    continue;
                }
                if association.referenced(&declaring.name) != entity {
                    continue;
                }
                let holder = association.holder(&declaring.name);
                if !self.entities.contains_key(holder) {
                    continue;
                }
                edges.insert(CascadeEdge {
                    dependent: holder.to_string(),
                    foreign_key: association.foreign_key.clone(),
                });
            }
        }
        edges.into_iter().collect()
    }

    /// Entities transitively reachable over cascade edges. The start entity is only part of
    /// the result when a cycle leads back to it.
    pub fn cascade_closure(&self, entity: &str) -> BTreeSet<String> {
        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::from([entity.to_string()]);
        while let Some(current) = queue.pop_front() {
            for edge in self.cascade_edges(&current) {
                if reached.insert(edge.dependent.clone()) {
                    queue.push_back(edge.dependent);
                }
            }
        }
        reached
    }

    /// Table definition implied by an entity, foreign keys derived from its associations.
    pub fn table_spec(&self, entity: &EntityDef) -> TableSpec {
        let references = self.references_held_by(&entity.name);
        let mut table = TableSpec::entity(entity.table.clone());
        for attribute in &entity.attributes {
            table = table.column(attribute.to_column(references.get(&attribute.name).cloned()));
        }
        if entity.timestamps {
            table = table.timestamps();
        }
        if entity.paranoid {
            table = table.paranoid();
        }
        table
    }

    /// Shape every migration together must produce.
    pub fn target_shape(&self) -> MotorlotResult<SchemaShape> {
        let mut shape = SchemaShape::new();
        for entity in self.entities.values() {
            shape.apply(&SchemaChange::CreateTable(self.table_spec(entity)))?;
        }
        Ok(shape)
    }

    fn references_held_by(&self, holder: &str) -> BTreeMap<String, ForeignKeySpec> {
        let mut references = BTreeMap::new();
        for declaring in self.entities.values() {
            for association in &declaring.associations {
                if association.holder(&declaring.name) != holder {
                    continue;
                }
                if let Some(reference) = self.reference_for(&declaring.name, association) {
                    references
                        .entry(association.foreign_key.clone())
                        .or_insert(reference);
                }
            }
        }
        references
    }
}
