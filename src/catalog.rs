//! Schema catalog: entity definitions used to resolve and type field paths.
//!
//! The schema is supplied explicitly, either through the builder methods or
//! deserialized from JSON, and is read-only once handed to a resolver.

use crate::access::DataType;
use crate::expression::{ExpressionError, ExpressionResult};
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod field;

pub use cache::CachedResolver;
pub use field::{FieldDescriptor, FieldResolver, PathSegment};

/// Declared symbols of an enumerated field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub symbols: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

/// Declared type of an entity field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldTypeRepr", into = "FieldTypeRepr")]
pub enum FieldType {
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    DateTime,
    Enum(EnumType),
    /// Reference to another entity, by entity name
    Entity(String),
}

impl FieldType {
    pub fn data_type(&self) -> DataType {
        match self {
            FieldType::Boolean => DataType::Boolean,
            FieldType::Integer => DataType::Integer,
            FieldType::Decimal => DataType::Decimal,
            FieldType::String => DataType::Varchar,
            FieldType::Date => DataType::Date,
            FieldType::DateTime => DataType::Timestamp,
            FieldType::Enum(_) => DataType::Enum,
            FieldType::Entity(_) => DataType::Entity,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScalarTag {
    Boolean,
    Integer,
    Decimal,
    String,
    Date,
    Datetime,
}

/// Wire shape of a field type: `"integer"`, `{"enum": [..]}` or `{"entity": ".."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum FieldTypeRepr {
    Scalar(ScalarTag),
    Enum {
        #[serde(rename = "enum")]
        symbols: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Entity {
        entity: String,
    },
}

impl TryFrom<FieldTypeRepr> for FieldType {
    type Error = String;

    fn try_from(repr: FieldTypeRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            FieldTypeRepr::Scalar(ScalarTag::Boolean) => FieldType::Boolean,
            FieldTypeRepr::Scalar(ScalarTag::Integer) => FieldType::Integer,
            FieldTypeRepr::Scalar(ScalarTag::Decimal) => FieldType::Decimal,
            FieldTypeRepr::Scalar(ScalarTag::String) => FieldType::String,
            FieldTypeRepr::Scalar(ScalarTag::Date) => FieldType::Date,
            FieldTypeRepr::Scalar(ScalarTag::Datetime) => FieldType::DateTime,
            FieldTypeRepr::Enum { symbols, .. } if symbols.is_empty() => {
                return Err("enum type must declare at least one symbol".to_string())
            }
            FieldTypeRepr::Enum { symbols, name } => {
                FieldType::Enum(EnumType::new(name.unwrap_or_else(|| "enum".to_string()), symbols))
            }
            FieldTypeRepr::Entity { entity } => FieldType::Entity(entity),
        })
    }
}

impl From<FieldType> for FieldTypeRepr {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Boolean => FieldTypeRepr::Scalar(ScalarTag::Boolean),
            FieldType::Integer => FieldTypeRepr::Scalar(ScalarTag::Integer),
            FieldType::Decimal => FieldTypeRepr::Scalar(ScalarTag::Decimal),
            FieldType::String => FieldTypeRepr::Scalar(ScalarTag::String),
            FieldType::Date => FieldTypeRepr::Scalar(ScalarTag::Date),
            FieldType::DateTime => FieldTypeRepr::Scalar(ScalarTag::Datetime),
            FieldType::Enum(enum_type) => FieldTypeRepr::Enum {
                symbols: enum_type.symbols,
                name: Some(enum_type.name),
            },
            FieldType::Entity(entity) => FieldTypeRepr::Entity { entity },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Definition of one entity: its storage table, identifier and typed fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            identifier: None,
            fields: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_identifier(mut self, field: impl Into<String>) -> Self {
        self.identifier = Some(field.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Storage table name; defaults to the lower-cased entity name
    pub fn table(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.field_type)
    }
}

/// All entities known to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    entities: Vec<EntitySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntitySchema) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(&self) -> &[EntitySchema] {
        &self.entities
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity(&self, name: &str) -> ExpressionResult<&EntitySchema> {
        self.get(name).ok_or_else(|| ExpressionError::UnknownEntity {
            name: name.to_string(),
        })
    }

    /// Check that entity names are unique, every reference targets a declared
    /// entity and every identifier names a scalar field of its entity.
    pub fn validate(&self) -> ExpressionResult<()> {
        for (i, entity) in self.entities.iter().enumerate() {
            if self.entities[..i].iter().any(|e| e.name == entity.name) {
                return Err(ExpressionError::malformed(format!(
                    "entity {} is declared twice",
                    entity.name
                )));
            }

            for field in &entity.fields {
                if let FieldType::Entity(target) = &field.field_type {
                    self.entity(target)?;
                }
            }

            if let Some(identifier) = &entity.identifier {
                match entity.field_type(identifier) {
                    Some(FieldType::Entity(_)) | None => {
                        return Err(ExpressionError::unknown_field(format!(
                            "{}.{}",
                            entity.name, identifier
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}
