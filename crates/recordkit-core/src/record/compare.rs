//! Sentinel-aware structural comparison of records.
//!
//! `diff` walks two records of the same type field by field and reports every
//! difference as one human-readable message naming the full field path. In
//! tolerant mode, `Undefined` on either side (including a nested record whose
//! fields are all `Undefined`) matches anything.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use super::Record;
use crate::errors::{RecordError, Result};
use crate::field_path::{self, SEPARATOR};
use crate::schema::FieldKind;
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

/// Options for [`Record::diff`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Field paths to leave out of the comparison
    pub ignore_paths: Vec<String>,
    /// Treat `Undefined` on either side as a wildcard
    pub tolerate_sentinel: bool,
    /// Compare the records' unique identification first
    pub check_identity: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_paths: Vec::new(),
            tolerate_sentinel: false,
            check_identity: true,
        }
    }
}

impl DiffOptions {
    /// Strict comparison that also checks identity
    pub fn strict() -> Self {
        Self::default()
    }

    /// Comparison treating `Undefined` as a wildcard
    pub fn tolerant() -> Self {
        Self {
            tolerate_sentinel: true,
            ..Self::default()
        }
    }

    pub fn with_ignore_path(mut self, path: impl Into<String>) -> Self {
        self.ignore_paths.push(path.into());
        self
    }

    pub fn with_tolerate_sentinel(mut self, tolerate: bool) -> Self {
        self.tolerate_sentinel = tolerate;
        self
    }

    pub fn with_check_identity(mut self, check: bool) -> Self {
        self.check_identity = check;
        self
    }
}

impl Record {
    /// True if every field is `Undefined`, counting nested records whose
    /// fields are all `Undefined` as `Undefined` themselves.
    pub fn all_fields_sentinel(&self) -> bool {
        self.values.borrow().iter().all(|value| match value {
            Value::Undefined => true,
            Value::Record(nested) => nested.all_fields_sentinel(),
            _ => false,
        })
    }

    /// List the differences between this record and `other`.
    ///
    /// An empty list means the records match under `options`.
    ///
    /// # Errors
    /// * `TypeMismatch` - the two records are of different types
    pub fn diff(&self, other: &Record, options: &DiffOptions) -> Result<Vec<String>> {
        log_op_start!(
            "record_diff",
            record = self.type_name(),
            tolerate_sentinel = options.tolerate_sentinel
        );
        let start = Instant::now();

        let messages = diff_impl(self, other, options, "").map_err(|e| {
            log_op_error!(
                "record_diff",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                record = self.type_name()
            );
            e
        })?;

        log_op_end!(
            "record_diff",
            duration_ms = start.elapsed().as_millis() as u64,
            record = self.type_name(),
            diff_count = messages.len()
        );
        Ok(messages)
    }

    /// True if [`Record::diff`] reports no difference.
    ///
    /// # Errors
    /// * `TypeMismatch` - the two records are of different types
    pub fn equals(&self, other: &Record, options: &DiffOptions) -> Result<bool> {
        Ok(self.diff(other, options)?.is_empty())
    }

    /// Total order used to sort records by identity.
    ///
    /// Orders by type name, unique identification, then field values in
    /// declaration order. Records that are `==` compare `Equal`; any other
    /// tie is broken by schema and instance address.
    pub(crate) fn total_cmp(&self, other: &Record) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        self.type_name()
            .cmp(other.type_name())
            .then_with(|| {
                self.unique_identification()
                    .total_cmp(&other.unique_identification())
            })
            .then_with(|| {
                let theirs = other.field_values();
                for ((_, mine), (_, theirs)) in self.field_values().into_iter().zip(theirs) {
                    let ord = collapse(mine).total_cmp(&collapse(theirs));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
            .then_with(|| Arc::as_ptr(&self.schema).cmp(&Arc::as_ptr(&other.schema)))
            .then_with(|| Rc::as_ptr(&self.values).cmp(&Rc::as_ptr(&other.values)))
    }

    /// `diff` without boundary logging, for callers that log themselves.
    pub(crate) fn diff_unlogged(&self, other: &Record, options: &DiffOptions) -> Result<Vec<String>> {
        diff_impl(self, other, options, "")
    }
}

/// Strict, non-logging equality used by `PartialEq`.
pub(super) fn strict_equal(this: &Record, other: &Record) -> bool {
    matches!(diff_impl(this, other, &DiffOptions::strict(), ""), Ok(messages) if messages.is_empty())
}

fn diff_impl(
    this: &Record,
    other: &Record,
    options: &DiffOptions,
    prefix: &str,
) -> Result<Vec<String>> {
    let tolerant = options.tolerate_sentinel;
    if tolerant && (this.all_fields_sentinel() || other.all_fields_sentinel()) {
        return Ok(Vec::new());
    }

    if !this.schema.is_same_type(&other.schema) {
        return Err(RecordError::type_mismatch(
            this.type_name(),
            if prefix.is_empty() { "<record>" } else { prefix },
            this.type_name(),
            other.type_name(),
        ));
    }

    let mut messages = Vec::new();

    if options.check_identity {
        let mine = this.unique_identification();
        let theirs = other.unique_identification();
        if !values_match(&mine, &theirs, tolerant) {
            let at = if prefix.is_empty() {
                String::new()
            } else {
                format!(" of `{}`", prefix)
            };
            messages.push(format!(
                "different unique identification{} - self: `{}` | other: `{}`",
                at, mine, theirs
            ));
        }
    }

    let mine_values = this.field_values();
    let theirs_values = other.field_values();
    for ((field, (name, mine)), (_, theirs)) in this
        .schema
        .fields()
        .iter()
        .zip(mine_values)
        .zip(theirs_values)
    {
        if options.ignore_paths.iter().any(|p| *p == name) {
            continue;
        }
        let path = child_path(prefix, &name);
        let mine = collapse(mine);
        let theirs = collapse(theirs);
        if tolerant && (mine.is_undefined() || theirs.is_undefined()) {
            continue;
        }

        match (field.kind(), &mine, &theirs) {
            (FieldKind::List(_), Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    messages.push(format!(
                        "different list length for field `{}` - self: {} | other: {}",
                        path,
                        a.len(),
                        b.len()
                    ));
                    continue;
                }
                for (idx, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                    let item_path = format!("{}[{}]", path, idx);
                    match (x, y) {
                        (Value::Record(rx), Value::Record(ry)) => {
                            let item_options = DiffOptions {
                                ignore_paths: Vec::new(),
                                tolerate_sentinel: tolerant,
                                check_identity: true,
                            };
                            messages.extend(diff_impl(rx, ry, &item_options, &item_path)?);
                        }
                        _ if !values_match(x, y, tolerant) => messages.push(format!(
                            "different value for field `{}` - self: `{}` | other: `{}`",
                            item_path, x, y
                        )),
                        _ => {}
                    }
                }
            }
            (FieldKind::Record(_), Value::Record(a), Value::Record(b)) => {
                let sub_ignores = field_path::strip_prefix_all(&options.ignore_paths, &name);
                let sub_options = DiffOptions {
                    check_identity: !sub_ignores.iter().any(|p| p == "id"),
                    ignore_paths: sub_ignores,
                    tolerate_sentinel: tolerant,
                };
                messages.extend(diff_impl(a, b, &sub_options, &path)?);
            }
            _ if mine != theirs => messages.push(format!(
                "different value for field `{}` - self: `{}` | other: `{}`",
                path, mine, theirs
            )),
            _ => {}
        }
    }

    if !messages.is_empty() {
        tracing::debug!(
            record = this.type_name(),
            path = prefix,
            count = messages.len(),
            "records differ"
        );
    }
    Ok(messages)
}

/// A nested record with only `Undefined` fields counts as `Undefined`.
fn collapse(value: Value) -> Value {
    match value {
        Value::Record(nested) if nested.all_fields_sentinel() => Value::Undefined,
        other => other,
    }
}

fn values_match(a: &Value, b: &Value, tolerant: bool) -> bool {
    if !tolerant {
        return a == b;
    }
    match (a, b) {
        (Value::Undefined, _) | (_, Value::Undefined) => true,
        (Value::Record(r), _) | (_, Value::Record(r)) if r.all_fields_sentinel() => true,
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| values_match(x, y, true))
        }
        _ => a == b,
    }
}

fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, name)
    }
}
