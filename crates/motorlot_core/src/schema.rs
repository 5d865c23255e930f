use serde::{Deserialize, Serialize};

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const DELETED_AT: &str = "deletedAt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    BigInteger,
    Decimal { precision: u32, scale: u32 },
    String { length: Option<u32> },
    Text,
    Boolean,
    Timestamp,
    Time,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Integer(i64),
    /// Decimal literal kept as text so it round-trips exactly.
    Decimal(String),
    Text(String),
    Boolean(bool),
    CurrentTimestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub table: String,
    pub column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

impl ForeignKeySpec {
    /// Reference to `table.id`, updates cascading.
    pub fn to_id(table: impl Into<String>, on_delete: ReferentialAction) -> Self {
        Self {
            table: table.into(),
            column: ID_COLUMN.to_string(),
            on_delete,
            on_update: ReferentialAction::Cascade,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub references: Option<ForeignKeySpec>,
}

impl ColumnSpec {
    /// Nullable column with no default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            unique: false,
            primary_key: false,
            auto_increment: false,
            references: None,
        }
    }

    pub fn id() -> Self {
        Self {
            nullable: false,
            primary_key: true,
            auto_increment: true,
            ..Self::new(ID_COLUMN, ColumnType::Integer)
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

    /// Integer foreign key to `table.id`.
    pub fn foreign_key(
        name: impl Into<String>,
        table: impl Into<String>,
        on_delete: ReferentialAction,
    ) -> Self {
        Self::integer(name).references(ForeignKeySpec::to_id(table, on_delete))
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, reference: ForeignKeySpec) -> Self {
        self.references = Some(reference);
        self
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Named constraint added to an existing table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub column: String,
    pub references: ForeignKeySpec,
}

impl ForeignKeyConstraint {
    pub fn new(table: &str, column: impl Into<String>, references: ForeignKeySpec) -> Self {
        let column = column.into();
        Self {
            name: foreign_key_name(table, &column),
            column,
            references,
        }
    }
}

pub fn foreign_key_name(table: &str, column: &str) -> String {
    format!("fk_{table}_{column}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Table with the auto-increment `id` primary key every entity carries.
    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name).column(ColumnSpec::id())
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Appends `createdAt` and `updatedAt`.
    pub fn timestamps(self) -> Self {
        self.column(ColumnSpec::timestamp(CREATED_AT).not_null())
            .column(ColumnSpec::timestamp(UPDATED_AT).not_null())
    }

    /// Appends the nullable `deletedAt` soft-delete column.
    pub fn paranoid(self) -> Self {
        self.column(ColumnSpec::timestamp(DELETED_AT))
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }
}
