//! Recursive construction of records from keyword maps.

use std::sync::Arc;
use std::time::Instant;

use super::Record;
use crate::errors::{RecordError, Result};
use crate::schema::{ElementKind, FieldDescriptor, FieldKind, RecordSchema};
use crate::value::{FieldMap, Value};
use crate::{field_path, log_op_end, log_op_error, log_op_start};

impl Record {
    /// Build a record from a flat (or partially nested) keyword map.
    ///
    /// Keys are field paths (`a__b__c`); values of nested-record fields may
    /// also be given as maps or as records of the nested type. Every schema
    /// field must be mentioned exactly once; use `Value::Undefined` for fields
    /// left open.
    ///
    /// # Errors
    /// * `UnknownField` - a key is not a field of the record
    /// * `MissingField` - a field is not mentioned
    /// * `TypeMismatch` - a value does not fit its field
    pub fn create_from_flat(schema: &Arc<RecordSchema>, flat: FieldMap) -> Result<Record> {
        log_op_start!("record_create", record = schema.name());
        let start = Instant::now();

        let record = construct(schema, flat).map_err(|e| {
            log_op_error!(
                "record_create",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                record = schema.name()
            );
            e
        })?;

        log_op_end!(
            "record_create",
            duration_ms = start.elapsed().as_millis() as u64,
            record = schema.name()
        );
        Ok(record)
    }

    /// Build a record with every field `Undefined`.
    ///
    /// With `nested`, nested-record fields hold records that are themselves
    /// all-sentinel; otherwise they hold `Undefined` directly.
    ///
    /// # Errors
    /// Only fails if the schema is inconsistent with its own field paths.
    pub fn create_all_sentinel(schema: &Arc<RecordSchema>, nested: bool) -> Result<Record> {
        log_op_start!("record_create_all_sentinel", record = schema.name(), nested = nested);
        let start = Instant::now();

        let record = all_sentinel(schema, nested).map_err(|e| {
            log_op_error!(
                "record_create_all_sentinel",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                record = schema.name()
            );
            e
        })?;

        log_op_end!(
            "record_create_all_sentinel",
            duration_ms = start.elapsed().as_millis() as u64,
            record = schema.name()
        );
        Ok(record)
    }
}

pub(super) fn all_sentinel(schema: &Arc<RecordSchema>, nested: bool) -> Result<Record> {
    let flat: FieldMap = schema
        .field_paths(None, nested, &[])?
        .into_iter()
        .map(|path| (path, Value::Undefined))
        .collect();
    construct(schema, flat)
}

/// How construction treats fields the input map does not mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Missing {
    Reject,
    /// Leave them `Undefined` (used when assigning maps through `set`)
    Undefined,
}

pub(super) fn construct(schema: &Arc<RecordSchema>, flat: FieldMap) -> Result<Record> {
    construct_with(schema, flat, Missing::Reject)
}

pub(super) fn construct_with(
    schema: &Arc<RecordSchema>,
    flat: FieldMap,
    missing: Missing,
) -> Result<Record> {
    let mut given = field_path::nest_shallow(flat);

    if let Some(unknown) = given.keys().find(|key| schema.field(key).is_none()) {
        return Err(RecordError::UnknownField {
            record: schema.name().to_string(),
            field: unknown.clone(),
        });
    }

    let mut values = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let value = match (given.remove(field.name()), missing) {
            (Some(value), _) => value,
            (None, Missing::Undefined) => Value::Undefined,
            (None, Missing::Reject) => {
                return Err(RecordError::MissingField {
                    record: schema.name().to_string(),
                    field: field.name().to_string(),
                })
            }
        };
        values.push(construct_field(schema, field, value, missing)?);
    }

    tracing::debug!(record = schema.name(), "record constructed");
    Ok(Record::from_values(Arc::clone(schema), values))
}

pub(super) fn construct_field(
    schema: &RecordSchema,
    field: &FieldDescriptor,
    value: Value,
    missing: Missing,
) -> Result<Value> {
    let mismatch = |expected: String, found: &Value| {
        RecordError::type_mismatch(schema.name(), field.name(), expected, found.type_label())
    };

    match (field.kind(), value) {
        (_, Value::Undefined) => Ok(Value::Undefined),
        (_, Value::Null) if field.is_optional() => Ok(Value::Null),
        (FieldKind::List(element), Value::List(items)) => items
            .into_iter()
            .map(|item| construct_element(schema, field, element, item, missing))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (FieldKind::Record(nested), Value::Map(map)) => {
            construct_with(nested, map, missing).map(Value::Record)
        }
        (FieldKind::Record(nested), Value::Record(record))
            if record.schema().is_same_type(nested) =>
        {
            Ok(Value::Record(record))
        }
        (FieldKind::Scalar(kind), value) if kind.accepts(&value) => Ok(value),
        (_, value) => Err(mismatch(field.declared_type().to_string(), &value)),
    }
}

fn construct_element(
    schema: &RecordSchema,
    field: &FieldDescriptor,
    element: &ElementKind,
    item: Value,
    missing: Missing,
) -> Result<Value> {
    match (element, item) {
        (_, Value::Undefined) => Ok(Value::Undefined),
        (ElementKind::Record(nested), Value::Map(map)) => {
            construct_with(nested, map, missing).map(Value::Record)
        }
        (ElementKind::Record(nested), Value::Record(record))
            if record.schema().is_same_type(nested) =>
        {
            Ok(Value::Record(record))
        }
        (ElementKind::Scalar(kind), item) if kind.accepts(&item) => Ok(item),
        (element, item) => {
            let expected = match element {
                ElementKind::Scalar(kind) => kind.name().to_string(),
                ElementKind::Record(nested) => nested.name().to_string(),
            };
            Err(RecordError::type_mismatch(
                schema.name(),
                field.name(),
                format!("list items of type {}", expected),
                item.type_label(),
            ))
        }
    }
}
