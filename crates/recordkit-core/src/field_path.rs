//! Field-path codec.
//!
//! Converts between flat keyword maps whose keys are `__`-joined field paths
//! (`a__b__c`) and the equivalent nested maps. The codec knows nothing about
//! records: it only rewrites `Value::Map` trees.
//!
//! ```
//! use recordkit_core::{fields, field_path};
//!
//! let flat = fields! { "a__b__c" => 2, "a__d" => 3, "b" => 1 };
//! let nested = field_path::nest(&flat);
//! assert_eq!(field_path::flatten(&nested), flat);
//! ```

use crate::value::{FieldMap, Value};

/// Separator between the segments of a field path.
pub const SEPARATOR: &str = "__";

/// Split a path into its segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).collect()
}

/// Join segments into a path.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Split off the first segment: `a__b__c` → `("a", Some("b__c"))`.
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.split_once(SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Strip `prefix__` from every path that starts with it.
///
/// Used to forward ignore lists into a nested field.
pub fn strip_prefix_all(paths: &[String], prefix: &str) -> Vec<String> {
    let marker = format!("{}{}", prefix, SEPARATOR);
    paths
        .iter()
        .filter_map(|p| p.strip_prefix(&marker).map(str::to_string))
        .collect()
}

/// Fully nest a flat map: every path segment becomes one map level.
///
/// Map values are nested recursively and merged with sibling sub-path
/// writes; list values are nested element-wise.
pub fn nest(flat: &FieldMap) -> FieldMap {
    let mut result = FieldMap::new();
    for (key, value) in flat {
        insert_nested(&mut result, key, nest_value(value));
    }
    result
}

/// Nest only the first path segment.
///
/// `{"a__b__c": 1, "d": 2}` becomes `{"a": {"b__c": 1}, "d": 2}`. Map values
/// are left as they are apart from merging with sibling sub-path keys.
pub fn nest_shallow(flat: FieldMap) -> FieldMap {
    let mut result = FieldMap::new();
    for (key, value) in flat {
        match split_first(&key) {
            (head, Some(rest)) => {
                let slot = result
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Map(FieldMap::new()));
                if !matches!(slot, Value::Map(_)) {
                    *slot = Value::Map(FieldMap::new());
                }
                if let Value::Map(sub) = slot {
                    sub.insert(rest.to_string(), value);
                }
            }
            (head, None) => match (result.get_mut(head), value) {
                (Some(Value::Map(existing)), Value::Map(incoming)) => {
                    existing.extend(incoming);
                }
                (_, value) => {
                    result.insert(head.to_string(), value);
                }
            },
        }
    }
    result
}

/// Flatten a nested map into `__`-joined paths.
///
/// Lists stay under their own key; map elements inside a list are flattened
/// on their own, so no path crosses a list boundary.
pub fn flatten(nested: &FieldMap) -> FieldMap {
    let mut result = FieldMap::new();
    for (key, value) in nested {
        match value {
            Value::Map(sub) => {
                for (sub_key, sub_value) in flatten(sub) {
                    result.insert(format!("{}{}{}", key, SEPARATOR, sub_key), sub_value);
                }
            }
            other => {
                result.insert(key.clone(), flatten_value(other));
            }
        }
    }
    result
}

fn flatten_value(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(flatten(map)),
        Value::List(items) => Value::List(items.iter().map(flatten_value).collect()),
        other => other.clone(),
    }
}

fn nest_value(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(nest(map)),
        Value::List(items) => Value::List(items.iter().map(nest_value).collect()),
        other => other.clone(),
    }
}

fn insert_nested(target: &mut FieldMap, path: &str, value: Value) {
    match split_first(path) {
        (head, Some(rest)) => {
            let slot = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Map(FieldMap::new()));
            if !matches!(slot, Value::Map(_)) {
                // sub-path write over a scalar: the map replaces it
                *slot = Value::Map(FieldMap::new());
            }
            if let Value::Map(sub) = slot {
                insert_nested(sub, rest, value);
            }
        }
        (head, None) => match (target.get_mut(head), value) {
            (Some(Value::Map(existing)), Value::Map(incoming)) => {
                for (k, v) in incoming {
                    insert_nested(existing, &k, v);
                }
            }
            (_, value) => {
                target.insert(head.to_string(), value);
            }
        },
    }
}
