use crate::access::DataType;
use crate::catalog::{FieldType, Schema};
use crate::expression::{ExpressionError, ExpressionResult};

/// One hop of a resolved path: the entity it is read from and the field name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub entity: String,
    pub field: String,
}

/// A dotted field path resolved against the schema.
///
/// `segments` lists every hop, root entity first. When the path ends on an
/// entity reference, a final hop to the referenced entity's identifier is
/// appended and `reference` names the referenced entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    path: String,
    segments: Vec<PathSegment>,
    field_type: FieldType,
    reference: Option<String>,
}

impl FieldDescriptor {
    /// The path as written by the caller
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Field names to follow from the root record to the attribute
    pub fn field_names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.field.as_str()).collect()
    }

    /// Hops that cross into another entity (all but the last)
    pub fn joins(&self) -> &[PathSegment] {
        &self.segments[..self.segments.len().saturating_sub(1)]
    }

    /// The final hop, holding the compared attribute
    pub fn attribute(&self) -> &PathSegment {
        // resolve() never builds an empty segment list
        &self.segments[self.segments.len() - 1]
    }

    /// Type operands are coerced to; the identifier's type for references
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Name of the referenced entity when the path ends on a reference
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Type used for operator checks
    pub fn data_type(&self) -> DataType {
        match self.reference {
            Some(_) => DataType::Entity,
            None => self.field_type.data_type(),
        }
    }

    pub fn is_comparable(&self) -> bool {
        self.data_type().is_comparable()
    }
}

/// Resolves dotted paths relative to a root entity.
pub trait FieldResolver {
    fn resolve(&self, entity: &str, path: &str) -> ExpressionResult<FieldDescriptor>;
}

impl FieldResolver for Schema {
    fn resolve(&self, entity: &str, path: &str) -> ExpressionResult<FieldDescriptor> {
        let mut current = self.entity(entity)?;
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ExpressionError::unknown_field(path));
        }
        let Some((last, init)) = parts.split_last() else {
            return Err(ExpressionError::unknown_field(path));
        };

        let mut segments = Vec::with_capacity(parts.len() + 1);
        for part in init {
            segments.push(PathSegment {
                entity: current.name.clone(),
                field: part.to_string(),
            });
            match current.field_type(part) {
                Some(FieldType::Entity(target)) => current = self.entity(target)?,
                _ => return Err(ExpressionError::unknown_field(path)),
            }
        }

        let field_type = current
            .field_type(last)
            .ok_or_else(|| ExpressionError::unknown_field(path))?;
        segments.push(PathSegment {
            entity: current.name.clone(),
            field: last.to_string(),
        });

        let FieldType::Entity(target) = field_type else {
            return Ok(FieldDescriptor {
                path: path.to_string(),
                segments,
                field_type: field_type.clone(),
                reference: None,
            });
        };

        let referenced = self.entity(target)?;
        let identifier = referenced
            .identifier
            .as_deref()
            .ok_or_else(|| ExpressionError::unknown_field(path))?;
        let identifier_type = referenced
            .field_type(identifier)
            .ok_or_else(|| ExpressionError::unknown_field(path))?;
        segments.push(PathSegment {
            entity: referenced.name.clone(),
            field: identifier.to_string(),
        });

        log::trace!("resolved {entity}.{path} to reference {target}.{identifier}");
        Ok(FieldDescriptor {
            path: path.to_string(),
            segments,
            field_type: identifier_type.clone(),
            reference: Some(target.clone()),
        })
    }
}
