//! Core types for the Motorlot data model: reversible schema change units, migration
//! planning, the entity model registry and soft-delete lifecycle rules.

pub mod change;
pub mod error;
pub mod lifecycle;
pub mod paging;
pub mod password;
pub mod plan;
pub mod registry;
pub mod schema;
pub mod shape;
pub mod time;
pub mod version;

pub use change::{MigrationUnit, SchemaChange};
pub use error::{MotorlotError, MotorlotResult};
pub use lifecycle::{DeleteAction, ReadScope, RowState, delete_action};
pub use paging::{Paging, paging};
pub use password::{hash_password, verify_password};
pub use plan::{LedgerEntry, UnitStatus};
pub use registry::{
    AssociationDef, AssociationKind, AttributeDef, CascadeEdge, EntityDef, ModelRegistry,
};
pub use schema::{
    ColumnSpec, ColumnType, DefaultValue, ForeignKeyConstraint, ForeignKeySpec, IndexSpec,
    ReferentialAction, TableSpec,
};
pub use shape::{SchemaShape, TableShape};
pub use time::Timestamp;
pub use version::Version;
