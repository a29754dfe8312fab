//! Key-based row selection used to assemble the privilege report.
//!
//! A [`KeySet`] is built once from either bare values or from records plus a
//! key extractor, and [`select`] then keeps or drops rows by exact key
//! equality. Input rows are never modified and their order is preserved.

use std::collections::HashSet;
use std::hash::Hash;

/// Whether [`select`] keeps or drops the rows whose key is in the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Keep rows whose key is NOT in the reference set
    Filter,
    /// Keep rows whose key IS in the reference set
    Include,
}

/// Lookup values a row key is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet<K: Eq + Hash> {
    keys: HashSet<K>,
}

impl<K: Eq + Hash> KeySet<K> {
    /// Builds the set from bare values, e.g. a deny-list of names.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        Self {
            keys: values.into_iter().collect(),
        }
    }

    /// Builds the set from records, taking each record's key with `key`.
    ///
    /// The extractor must read the same field the selected rows are keyed on,
    /// e.g. `schema_oid` on both sequences and schemas.
    pub fn from_records<'a, R, F>(records: &'a [R], key: F) -> Self
    where
        F: Fn(&'a R) -> K,
    {
        Self {
            keys: records.iter().map(key).collect(),
        }
    }

    /// Checks whether `key` is a lookup value.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.keys.contains(key)
    }

    /// Number of distinct lookup values.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no lookup values.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Keeps or drops `rows` by matching `key(row)` against `reference`.
///
/// Matching is exact equality with no case or whitespace normalization.
/// Returns a new vector in input order.
///
/// # Example
/// ```rust
/// use pgprovision_core::select::{KeySet, SelectMode, select};
///
/// let names = vec!["pg_catalog".to_string(), "public".to_string()];
/// let deny = KeySet::from_values(["pg_catalog"]);
///
/// let kept = select(&names, |n| n.as_str(), SelectMode::Filter, &deny);
/// assert_eq!(kept, vec!["public".to_string()]);
/// ```
pub fn select<'a, R, K, F>(
    rows: &'a [R],
    key: F,
    mode: SelectMode,
    reference: &KeySet<K>,
) -> Vec<R>
where
    R: Clone,
    K: Eq + Hash,
    F: Fn(&'a R) -> K,
{
    rows.iter()
        .filter(|row| {
            let found = reference.contains(&key(*row));
            match mode {
                SelectMode::Include => found,
                SelectMode::Filter => !found,
            }
        })
        .cloned()
        .collect()
}
