//! Deduplicated insertion-ordered dictionaries used for categorical columns.
//!
//! A [`TypedSet`] maps each distinct value to the index it was first seen at
//! and additionally counts NaN and missing entries, which have no slot of
//! their own. One concrete set type exists per key kind; the fixed catalog
//! of class names is how wire data names which one to rebuild.

use crate::value::Value;
use thiserror::Error;

/// Failure to rebuild an ordered set from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// The class name is not in the catalog.
    #[error("unknown ordered set class: {class:?}")]
    UnknownClass {
        /// The offending class name.
        class: String,
    },
    /// A snapshot entry's key did not match the class's key kind.
    #[error("ordered set {class} snapshot holds a key of the wrong kind")]
    InvalidKey {
        /// The class whose snapshot was malformed.
        class: &'static str,
    },
}

/// An insertion-ordered value → first-seen-index dictionary with counters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedSet<T> {
    entries: Vec<(T, i64)>,
    count: i64,
    nan_count: i64,
    missing_count: i64,
}

impl<T: PartialEq + Clone> TypedSet<T> {
    /// An empty set.
    pub fn new() -> TypedSet<T> {
        TypedSet {
            entries: Vec::new(),
            count: 0,
            nan_count: 0,
            missing_count: 0,
        }
    }

    /// Rebuild from a snapshot: `(value, index)` pairs plus the counters.
    pub fn from_entries(
        entries: Vec<(T, i64)>,
        count: i64,
        nan_count: i64,
        missing_count: i64,
    ) -> TypedSet<T> {
        TypedSet {
            entries,
            count,
            nan_count,
            missing_count,
        }
    }

    /// Record a value, returning its index (existing or freshly assigned).
    pub fn insert(&mut self, value: T) -> i64 {
        self.count += 1;
        if let Some(index) = self.index_of(&value) {
            return index;
        }
        let index = self.entries.len() as i64;
        self.entries.push((value, index));
        index
    }

    /// Record a NaN observation.
    pub fn insert_nan(&mut self) {
        self.count += 1;
        self.nan_count += 1;
    }

    /// Record a missing observation.
    pub fn insert_missing(&mut self) {
        self.count += 1;
        self.missing_count += 1;
    }

    /// Index of a value, if present.
    pub fn index_of(&self, value: &T) -> Option<i64> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, index)| *index)
    }

    /// The `(value, index)` pairs in insertion order.
    pub fn entries(&self) -> &[(T, i64)] {
        &self.entries
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no distinct values were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total observations, NaN and missing included.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// NaN observations.
    pub fn nan_count(&self) -> i64 {
        self.nan_count
    }

    /// Missing observations.
    pub fn missing_count(&self) -> i64 {
        self.missing_count
    }
}

/// The catalog of concrete ordered-set types, one per key kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderedSet {
    /// String keys (`ordered_set_string`).
    Str(TypedSet<String>),
    /// 64-bit integer keys (`ordered_set_int64`).
    Int64(TypedSet<i64>),
    /// Double-precision keys (`ordered_set_float64`).
    Float64(TypedSet<f64>),
}

impl OrderedSet {
    /// The class name wire data uses to pick this concrete type.
    pub fn class_name(&self) -> &'static str {
        match self {
            OrderedSet::Str(_) => "ordered_set_string",
            OrderedSet::Int64(_) => "ordered_set_int64",
            OrderedSet::Float64(_) => "ordered_set_float64",
        }
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        match self {
            OrderedSet::Str(set) => set.len(),
            OrderedSet::Int64(set) => set.len(),
            OrderedSet::Float64(set) => set.len(),
        }
    }

    /// True when no distinct values were recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total observations.
    pub fn count(&self) -> i64 {
        match self {
            OrderedSet::Str(set) => set.count(),
            OrderedSet::Int64(set) => set.count(),
            OrderedSet::Float64(set) => set.count(),
        }
    }

    /// NaN observations.
    pub fn nan_count(&self) -> i64 {
        match self {
            OrderedSet::Str(set) => set.nan_count(),
            OrderedSet::Int64(set) => set.nan_count(),
            OrderedSet::Float64(set) => set.nan_count(),
        }
    }

    /// Missing observations.
    pub fn missing_count(&self) -> i64 {
        match self {
            OrderedSet::Str(set) => set.missing_count(),
            OrderedSet::Int64(set) => set.missing_count(),
            OrderedSet::Float64(set) => set.missing_count(),
        }
    }

    /// Snapshot the `(value, index)` pairs with keys as JSON values.
    pub fn snapshot_entries(&self) -> Vec<(Value, i64)> {
        match self {
            OrderedSet::Str(set) => set
                .entries()
                .iter()
                .map(|(v, i)| (Value::from(v.clone()), *i))
                .collect(),
            OrderedSet::Int64(set) => set
                .entries()
                .iter()
                .map(|(v, i)| (Value::Int(*v), *i))
                .collect(),
            OrderedSet::Float64(set) => set
                .entries()
                .iter()
                .map(|(v, i)| (Value::Float(*v), *i))
                .collect(),
        }
    }

    /// Rebuild a concrete set from its class name and snapshot.
    ///
    /// The class name is looked up in the fixed catalog; an unknown name is
    /// a [`SetError::UnknownClass`].
    pub fn from_snapshot(
        class: &str,
        entries: Vec<(Value, i64)>,
        count: i64,
        nan_count: i64,
        missing_count: i64,
    ) -> Result<OrderedSet, SetError> {
        match class {
            "ordered_set_string" => {
                let entries = entries
                    .into_iter()
                    .map(|(v, i)| match v {
                        Value::String(s) => Ok((s, i)),
                        _ => Err(SetError::InvalidKey {
                            class: "ordered_set_string",
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(OrderedSet::Str(TypedSet::from_entries(
                    entries,
                    count,
                    nan_count,
                    missing_count,
                )))
            }
            "ordered_set_int64" => {
                let entries = entries
                    .into_iter()
                    .map(|(v, i)| match v {
                        Value::Int(n) => Ok((n, i)),
                        _ => Err(SetError::InvalidKey {
                            class: "ordered_set_int64",
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(OrderedSet::Int64(TypedSet::from_entries(
                    entries,
                    count,
                    nan_count,
                    missing_count,
                )))
            }
            "ordered_set_float64" => {
                let entries = entries
                    .into_iter()
                    .map(|(v, i)| match v {
                        Value::Float(f) => Ok((f, i)),
                        Value::Int(n) => Ok((n as f64, i)),
                        _ => Err(SetError::InvalidKey {
                            class: "ordered_set_float64",
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(OrderedSet::Float64(TypedSet::from_entries(
                    entries,
                    count,
                    nan_count,
                    missing_count,
                )))
            }
            other => Err(SetError::UnknownClass {
                class: other.to_string(),
            }),
        }
    }
}
