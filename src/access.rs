//! Access layer: native values and the records built from them.
//!
//! - **Value**: Type-safe representation of field values after coercion
//! - **DataType**: Semantic type tags used by the resolver and coercer
//! - **Record**: An entity instance, possibly holding nested entities

pub mod record;
pub mod value;

pub use record::Record;
pub use value::{DataType, Value};
