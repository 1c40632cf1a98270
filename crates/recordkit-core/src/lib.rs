//! RecordKit Core - nested records with partially defined data
//!
//! This crate provides the data-record engine:
//! - `Value::Undefined`, the sentinel for fields deliberately left open
//! - The `__` field-path codec (flat keyword maps to nested maps and back)
//! - Declared record schemas with type introspection
//! - Recursive construction, field-path get/set and structural diff of records
//! - Record collections with filtering, sorting, identity lookup and diffing
//!
//! ```
//! use recordkit_core::{fields, DiffOptions, Record, RecordSchema, TypeExpr};
//!
//! let point = RecordSchema::builder("Point")
//!     .field("x", TypeExpr::int())
//!     .field("y", TypeExpr::int())
//!     .identify_by_field("y")
//!     .build()?;
//! let p = Record::create_from_flat(&point, fields! { "x" => 1, "y" => 2 })?;
//! let q = p.deep_copy();
//! q.set("x", 5)?;
//! assert_eq!(p.diff(&q, &DiffOptions::strict())?.len(), 1);
//! # Ok::<(), recordkit_core::RecordError>(())
//! ```

pub mod collection;
pub mod errors;
pub mod field_path;
pub mod filter;
pub mod introspect;
pub mod logging_facility;
pub mod record;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use collection::{CollectionDiffOptions, RecordCollection};
pub use errors::{ExError, ExErrorKind, RecordError, Result};
pub use filter::{FieldEquals, Filter};
pub use record::{DiffOptions, Record, SetMode};
pub use schema::{
    ElementKind, FieldDecl, FieldDescriptor, FieldKind, IdentityRule, RecordOptions, RecordSchema,
    ScalarKind, TypeExpr,
};
pub use value::{FieldMap, Value};
