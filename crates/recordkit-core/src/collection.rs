//! Ordered collections of records.
//!
//! A [`RecordCollection`] holds record handles. Transforms (`filter`, `sort`,
//! `copy`) return new collections that share the same records, so mutating a
//! record through one collection is visible through the other.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use crate::errors::{RecordError, Result};
use crate::filter::Filter;
use crate::record::{DiffOptions, Record};
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

/// Options for [`RecordCollection::diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionDiffOptions {
    /// Pair items by sorted unique identification instead of position
    pub ignore_order: bool,
    /// Field paths to leave out of every item comparison
    pub ignore_paths: Vec<String>,
    /// Treat `Undefined` as a wildcard
    pub tolerate_sentinel: bool,
}

impl CollectionDiffOptions {
    pub fn with_ignore_order(mut self, ignore_order: bool) -> Self {
        self.ignore_order = ignore_order;
        self
    }

    pub fn with_ignore_path(mut self, path: impl Into<String>) -> Self {
        self.ignore_paths.push(path.into());
        self
    }

    pub fn with_tolerate_sentinel(mut self, tolerate: bool) -> Self {
        self.tolerate_sentinel = tolerate;
        self
    }

    fn item_options(&self) -> DiffOptions {
        DiffOptions {
            ignore_paths: self.ignore_paths.clone(),
            tolerate_sentinel: self.tolerate_sentinel,
            check_identity: true,
        }
    }
}

/// Ordered sequence of records. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    items: Vec<Record>,
}

impl RecordCollection {
    pub fn new(items: Vec<Record>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Record> {
        self.items.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }

    pub fn push(&mut self, item: Record) {
        self.items.push(item);
    }

    /// Remove the first occurrence of `item` (compared by handle identity).
    /// Returns false if the handle is not part of the collection.
    pub fn remove(&mut self, item: &Record) -> bool {
        match self.items.iter().position(|r| r.ptr_eq(item)) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Items passing `filter`; `None` keeps everything.
    pub fn filter(&self, filter: Option<&dyn Filter>) -> RecordCollection {
        match filter {
            Some(filter) => self
                .items
                .iter()
                .filter(|item| filter.apply(item))
                .cloned()
                .collect(),
            None => self.copy(),
        }
    }

    /// Stable sort by a key extracted from each record.
    pub fn sort<K, F>(&self, key: F, reverse: bool) -> RecordCollection
    where
        K: Ord,
        F: Fn(&Record) -> K,
    {
        let mut items = self.items.clone();
        if reverse {
            items.sort_by(|a, b| key(b).cmp(&key(a)));
        } else {
            items.sort_by_key(&key);
        }
        RecordCollection { items }
    }

    /// Stable sort with a comparator.
    pub fn sort_by<F>(&self, compare: F) -> RecordCollection
    where
        F: FnMut(&Record, &Record) -> Ordering,
    {
        let mut items = self.items.clone();
        items.sort_by(compare);
        RecordCollection { items }
    }

    /// Shallow copy: a new sequence sharing the same records
    pub fn copy(&self) -> RecordCollection {
        self.clone()
    }

    /// Unique identification of every item, in order
    pub fn unique_identifiers(&self) -> Vec<Value> {
        self.items.iter().map(Record::unique_identification).collect()
    }

    /// True if no two items share a unique identification
    pub fn has_unique_elements(&self) -> bool {
        let ids = self.unique_identifiers();
        ids.iter()
            .enumerate()
            .all(|(idx, id)| !ids[idx + 1..].contains(id))
    }

    /// The single item whose unique identification equals `identifier`.
    ///
    /// # Errors
    /// * `NotFound` - no item carries the identifier
    /// * `AmbiguousMatch` - more than one item carries it
    pub fn by_identifier(&self, identifier: &Value) -> Result<&Record> {
        let mut matches = self
            .items
            .iter()
            .filter(|item| item.unique_identification() == *identifier);
        match (matches.next(), matches.count()) {
            (None, _) => Err(RecordError::NotFound {
                identifier: identifier.to_string(),
            }),
            (Some(item), 0) => Ok(item),
            (Some(_), rest) => Err(RecordError::AmbiguousMatch {
                identifier: identifier.to_string(),
                count: rest + 1,
            }),
        }
    }

    /// List the differences between this collection and `other`.
    ///
    /// Collections of different length produce exactly one message. Otherwise
    /// items are paired by position (or, with `ignore_order`, after sorting
    /// both sides by unique identification) and diffed pairwise.
    ///
    /// # Errors
    /// * `TypeMismatch` - a pair of items are of different record types
    pub fn diff(
        &self,
        other: &RecordCollection,
        options: &CollectionDiffOptions,
    ) -> Result<Vec<String>> {
        log_op_start!(
            "collection_diff",
            left_len = self.len(),
            right_len = other.len(),
            ignore_order = options.ignore_order
        );
        let start = Instant::now();

        let messages = self.diff_impl(other, options).map_err(|e| {
            log_op_error!(
                "collection_diff",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "collection_diff",
            duration_ms = start.elapsed().as_millis() as u64,
            left_len = self.len(),
            right_len = other.len(),
            diff_count = messages.len()
        );
        Ok(messages)
    }

    /// True if [`RecordCollection::diff`] reports no difference.
    ///
    /// # Errors
    /// * `TypeMismatch` - a pair of items are of different record types
    pub fn equals(&self, other: &RecordCollection, options: &CollectionDiffOptions) -> Result<bool> {
        Ok(self.diff(other, options)?.is_empty())
    }

    fn diff_impl(
        &self,
        other: &RecordCollection,
        options: &CollectionDiffOptions,
    ) -> Result<Vec<String>> {
        if self.len() != other.len() {
            return Ok(vec![format!(
                "list have different lengths (self: {} | other: {})",
                self.len(),
                other.len()
            )]);
        }

        let (mine, theirs) = if options.ignore_order {
            (self.sorted_by_identity(), other.sorted_by_identity())
        } else {
            (self.copy(), other.copy())
        };

        let item_options = options.item_options();
        let mut messages = Vec::new();
        for (a, b) in mine.iter().zip(theirs.iter()) {
            messages.extend(a.diff_unlogged(b, &item_options)?);
        }
        Ok(messages)
    }

    fn sorted_by_identity(&self) -> RecordCollection {
        self.sort_by(|a, b| {
            a.unique_identification()
                .total_cmp(&b.unique_identification())
                .then_with(|| a.total_cmp(b))
        })
    }
}

impl FromIterator<Record> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Record>> for RecordCollection {
    fn from(items: Vec<Record>) -> Self {
        Self { items }
    }
}

impl IntoIterator for RecordCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::ops::Index<usize> for RecordCollection {
    type Output = Record;

    fn index(&self, idx: usize) -> &Record {
        &self.items[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::schema::{RecordSchema, TypeExpr};
    use std::sync::Arc;

    fn schema() -> Arc<RecordSchema> {
        RecordSchema::builder("Item")
            .field("id", TypeExpr::int())
            .field("label", TypeExpr::str())
            .identify_by_field("id")
            .build()
            .unwrap()
    }

    fn item(schema: &Arc<RecordSchema>, id: i64, label: &str) -> Record {
        Record::create_from_flat(schema, fields! { "id" => id, "label" => label }).unwrap()
    }

    #[test]
    fn test_sort_is_stable_and_reversible() {
        let schema = schema();
        let items = RecordCollection::new(vec![
            item(&schema, 2, "b"),
            item(&schema, 1, "first"),
            item(&schema, 2, "a"),
            item(&schema, 1, "second"),
        ]);
        let by_id = |r: &Record| r.get("id").ok().and_then(|v| v.as_i64());
        let sorted = items.sort(by_id, false);
        let labels: Vec<String> = sorted
            .iter()
            .map(|r| r.get("label").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(labels, vec!["first", "second", "b", "a"]);

        let reversed = items.sort(by_id, true);
        assert_eq!(reversed[0].get("label").unwrap(), Value::from("b"));
        assert_eq!(reversed[3].get("label").unwrap(), Value::from("second"));
    }

    #[test]
    fn test_by_identifier_reports_ambiguity() {
        let schema = schema();
        let items = RecordCollection::new(vec![item(&schema, 1, "a"), item(&schema, 1, "b")]);
        let err = items.by_identifier(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, RecordError::AmbiguousMatch { count: 2, .. }));
        assert!(!items.has_unique_elements());
    }

    #[test]
    fn test_remove_uses_handle_identity() {
        let schema = schema();
        let a = item(&schema, 1, "a");
        let twin = item(&schema, 1, "a");
        let mut items = RecordCollection::new(vec![a.clone()]);
        assert!(!items.remove(&twin));
        assert!(items.remove(&a));
        assert!(items.is_empty());
    }

    #[test]
    fn test_filter_none_keeps_everything() {
        let schema = schema();
        let items = RecordCollection::new(vec![item(&schema, 1, "a"), item(&schema, 2, "b")]);
        assert_eq!(items.filter(None).len(), 2);
        let only_two = |r: &Record| r.unique_identification() == Value::Int(2);
        let filtered = items.filter(Some(&only_two));
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].ptr_eq(&items[1]));
    }

    #[test]
    fn test_diff_positional_vs_unordered() {
        let schema = schema();
        let left = RecordCollection::new(vec![item(&schema, 1, "a"), item(&schema, 2, "b")]);
        let right = RecordCollection::new(vec![item(&schema, 2, "b"), item(&schema, 1, "a")]);

        let positional = left.diff(&right, &CollectionDiffOptions::default()).unwrap();
        assert!(!positional.is_empty());

        let unordered = CollectionDiffOptions::default().with_ignore_order(true);
        assert!(left.diff(&right, &unordered).unwrap().is_empty());
    }
}
