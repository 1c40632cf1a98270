//! Predicates for [`RecordCollection::filter`](crate::collection::RecordCollection::filter).

use crate::record::Record;
use crate::value::Value;

/// A predicate over records.
pub trait Filter {
    /// True if `item` passes the filter
    fn apply(&self, item: &Record) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Record) -> bool,
{
    fn apply(&self, item: &Record) -> bool {
        self(item)
    }
}

/// Matches records whose value at `path` equals `value`.
///
/// Records where the path does not resolve never match.
#[derive(Debug, Clone)]
pub struct FieldEquals {
    path: String,
    value: Value,
}

impl FieldEquals {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl Filter for FieldEquals {
    fn apply(&self, item: &Record) -> bool {
        item.get(&self.path)
            .map(|found| found == self.value)
            .unwrap_or(false)
    }
}
