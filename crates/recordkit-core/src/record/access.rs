//! Field-path access: get, set and export.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::construct::{self, Missing};
use super::Record;
use crate::errors::{RecordError, Result};
use crate::field_path;
use crate::schema::{FieldDescriptor, FieldKind};
use crate::value::{FieldMap, Value};
use crate::{log_op_end, log_op_error, log_op_start};

/// How `set` treats nested records on the way to the addressed field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    /// Replace every nested record on the path with a fresh all-`Undefined`
    /// record before assigning the leaf. Siblings of the leaf are reset.
    #[default]
    Rebuild,
    /// Reuse nested records already present on the path; only `Null` or
    /// `Undefined` intermediates are replaced.
    Partial,
}

impl Record {
    /// Descriptor of the field addressed by `path`.
    ///
    /// # Errors
    /// * `PathResolution` - the path does not name a field of this record type
    pub fn field_descriptor(&self, path: &str) -> Result<&FieldDescriptor> {
        self.schema.resolve_field(path)
    }

    /// Read the value at a field path.
    ///
    /// A path running through an `Undefined` nested record yields
    /// `Undefined`.
    ///
    /// # Errors
    /// * `PathResolution` - unknown path, or a path running through a `Null`
    ///   nested record
    pub fn get(&self, path: &str) -> Result<Value> {
        self.schema.resolve_field(path)?;
        self.get_resolved(path, path)
    }

    fn get_resolved(&self, full_path: &str, path: &str) -> Result<Value> {
        let (head, rest) = field_path::split_first(path);
        let value = self.field_value(head).ok_or_else(|| {
            RecordError::path_resolution(self.type_name(), full_path, "field vanished from schema")
        })?;
        match (rest, value) {
            (None, value) => Ok(value),
            (Some(rest), Value::Record(nested)) => nested.get_resolved(full_path, rest),
            (Some(_), Value::Undefined) => Ok(Value::Undefined),
            (Some(_), other) => Err(RecordError::path_resolution(
                self.type_name(),
                full_path,
                format!("field `{}` holds {}, not a record", head, other.type_label()),
            )),
        }
    }

    /// Assign `value` at a field path, rebuilding nested records on the way.
    ///
    /// Equivalent to `set_with_mode(path, value, SetMode::Rebuild)`.
    ///
    /// # Errors
    /// See [`Record::set_with_mode`].
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with_mode(path, value, SetMode::Rebuild)
    }

    /// Assign `value` at a field path.
    ///
    /// Maps assigned to nested-record fields (or as list items of record
    /// lists) are expanded with the field-path codec; fields they do not
    /// mention stay `Undefined`.
    ///
    /// # Errors
    /// * `ImmutableRecord` - a record on the path is frozen
    /// * `PathResolution` - unknown path, or a non-terminal segment that is
    ///   not a nested-record field
    /// * `TypeMismatch` - the value does not fit the addressed field
    pub fn set_with_mode(&self, path: &str, value: impl Into<Value>, mode: SetMode) -> Result<()> {
        log_op_start!("record_set", record = self.type_name(), path = path);
        let start = Instant::now();

        self.set_impl(path, value.into(), mode).map_err(|e| {
            log_op_error!(
                "record_set",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                record = self.type_name(),
                path = path
            );
            e
        })?;

        log_op_end!(
            "record_set",
            duration_ms = start.elapsed().as_millis() as u64,
            record = self.type_name(),
            path = path
        );
        Ok(())
    }

    fn set_impl(&self, path: &str, value: Value, mode: SetMode) -> Result<()> {
        if self.schema.options().frozen {
            return Err(RecordError::ImmutableRecord {
                record: self.type_name().to_string(),
            });
        }

        let (head, rest) = field_path::split_first(path);
        let idx = self.schema.field_index(head).ok_or_else(|| {
            RecordError::path_resolution(
                self.type_name(),
                path,
                format!("can not find a field `{}`", head),
            )
        })?;
        let field = &self.schema.fields()[idx];

        let Some(rest) = rest else {
            let converted = construct::construct_field(&self.schema, field, value, Missing::Undefined)?;
            self.values.borrow_mut()[idx] = converted;
            return Ok(());
        };

        let FieldKind::Record(nested) = field.kind() else {
            return Err(RecordError::path_resolution(
                self.type_name(),
                path,
                format!(
                    "the field `{}` is not a nested record, can not set a nested value here",
                    head
                ),
            ));
        };

        let current = self.values.borrow()[idx].clone();
        match (mode, current) {
            (SetMode::Partial, Value::Record(existing)) => existing.set_impl(rest, value, mode),
            _ => {
                tracing::debug!(record = self.type_name(), field = head, "rebuilding nested record");
                let blank = construct::all_sentinel(nested, false)?;
                blank.set_impl(rest, value, mode)?;
                self.values.borrow_mut()[idx] = Value::Record(blank);
                Ok(())
            }
        }
    }

    /// Export the field values as a keyword map.
    ///
    /// Nested records become nested maps, lists of records become lists of
    /// maps. With `nested == false` the map is flattened into `__` paths.
    /// Either form is accepted by [`Record::create_from_flat`].
    pub fn to_field_map(&self, nested: bool) -> FieldMap {
        let map: FieldMap = self
            .field_values()
            .into_iter()
            .map(|(name, value)| (name, export_value(value)))
            .collect();
        if nested {
            map
        } else {
            field_path::flatten(&map)
        }
    }

    /// Independent copy of this record, nested records and list items
    /// included.
    pub fn deep_copy(&self) -> Record {
        let values = self
            .values
            .borrow()
            .iter()
            .map(deep_copy_value)
            .collect();
        Record::from_values(self.schema.clone(), values)
    }
}

fn export_value(value: Value) -> Value {
    match value {
        Value::Record(record) => Value::Map(record.to_field_map(true)),
        Value::List(items) => Value::List(items.into_iter().map(export_value).collect()),
        other => other,
    }
}

fn deep_copy_value(value: &Value) -> Value {
    match value {
        Value::Record(record) => Value::Record(record.deep_copy()),
        Value::List(items) => Value::List(items.iter().map(deep_copy_value).collect()),
        other => other.clone(),
    }
}
