//! Record instances.
//!
//! A [`Record`] is a handle onto one instance of a [`RecordSchema`]: one value
//! slot per schema field, in declaration order. Cloning the handle shares the
//! instance, so a `set` through one handle is visible through every other
//! (including handles held by collections). Use [`Record::deep_copy`] for an
//! independent instance.
//!
//! - `construct` - recursive construction from flat keyword maps
//! - `access` - field-path get/set and export
//! - `compare` - sentinel-aware structural diff

mod access;
mod compare;
mod construct;

pub use access::SetMode;
pub use compare::DiffOptions;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::field_path;
use crate::schema::{IdentityRule, RecordSchema};
use crate::value::Value;

/// Shared handle to one record instance.
#[derive(Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Rc<RefCell<Vec<Value>>>,
}

impl Record {
    fn from_values(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        Self {
            schema,
            values: Rc::new(RefCell::new(values)),
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Name of the record type
    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    /// True if both handles point at the same instance
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }

    /// Current value of a direct field, or `None` for an unknown name
    pub fn field_value(&self, name: &str) -> Option<Value> {
        let idx = self.schema.field_index(name)?;
        Some(self.values.borrow()[idx].clone())
    }

    /// Snapshot of all field values as `(name, value)` pairs in declaration
    /// order
    pub fn field_values(&self) -> Vec<(String, Value)> {
        let values = self.values.borrow();
        self.schema
            .fields()
            .iter()
            .zip(values.iter())
            .map(|(field, value)| (field.name().to_string(), value.clone()))
            .collect()
    }

    /// Identity of this record as defined by its schema's identity rule.
    ///
    /// Paths through an undefined nested record yield `Undefined`; paths
    /// through a `Null` nested record yield `Null`.
    pub fn unique_identification(&self) -> Value {
        match self.schema.identity() {
            IdentityRule::Field(path) => self.lookup_lenient(path),
            IdentityRule::Fields(paths) => {
                Value::List(paths.iter().map(|p| self.lookup_lenient(p)).collect())
            }
            IdentityRule::Custom(identify) => identify(self),
        }
    }

    fn lookup_lenient(&self, path: &str) -> Value {
        let (head, rest) = field_path::split_first(path);
        let Some(value) = self.field_value(head) else {
            return Value::Undefined;
        };
        match (rest, value) {
            (None, value) => value,
            (Some(rest), Value::Record(nested)) => nested.lookup_lenient(rest),
            (Some(_), Value::Undefined) => Value::Undefined,
            (Some(_), _) => Value::Null,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name());
        for (name, value) in self.field_values() {
            out.field(&name, &value);
        }
        out.finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema.name())?;
        if !self.schema.options().repr {
            return Ok(());
        }
        write!(f, "(")?;
        for (idx, (name, value)) in self.field_values().iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Value equality when the type declares `eq` (the default), handle identity
/// otherwise. Records of different types are never equal.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if !self.schema.options().eq || !self.schema.is_same_type(&other.schema) {
            return false;
        }
        compare::strict_equal(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::schema::{RecordOptions, TypeExpr};

    fn point(options: RecordOptions) -> Arc<RecordSchema> {
        RecordSchema::builder("Point")
            .field("x", TypeExpr::int())
            .field("y", TypeExpr::int())
            .identify_by_fields(["x", "y"])
            .options(options)
            .build()
            .unwrap()
    }

    #[test]
    fn test_clones_share_the_instance() {
        let p = Record::create_from_flat(&point(RecordOptions::default()), fields! { "x" => 1, "y" => 2 })
            .unwrap();
        let alias = p.clone();
        alias.set("x", 9).unwrap();
        assert!(p.ptr_eq(&alias));
        assert_eq!(p.get("x").unwrap(), Value::Int(9));
    }

    #[test]
    fn test_display_honours_repr_option() {
        let shown = Record::create_from_flat(&point(RecordOptions::default()), fields! { "x" => 1, "y" => 2 })
            .unwrap();
        assert_eq!(shown.to_string(), "Point(x=1, y=2)");

        let hidden = RecordOptions {
            repr: false,
            ..RecordOptions::default()
        };
        let p = Record::create_from_flat(&point(hidden), fields! { "x" => 1, "y" => 2 }).unwrap();
        assert_eq!(p.to_string(), "Point");
    }

    #[test]
    fn test_equality_without_eq_option_is_identity() {
        let options = RecordOptions {
            eq: false,
            ..RecordOptions::default()
        };
        let schema = point(options);
        let a = Record::create_from_flat(&schema, fields! { "x" => 1, "y" => 2 }).unwrap();
        let b = Record::create_from_flat(&schema, fields! { "x" => 1, "y" => 2 }).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_unique_identification_from_fields() {
        let p = Record::create_from_flat(&point(RecordOptions::default()), fields! { "x" => 1, "y" => 2 })
            .unwrap();
        assert_eq!(
            p.unique_identification(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }
}
