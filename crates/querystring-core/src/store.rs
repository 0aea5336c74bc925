//! Ordered multi-value parameter storage.
//!
//! A query string can repeat a key, so each name maps to a list of values.
//! Keys keep the order they were first inserted in; new keys go to the end.

use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::value::{normalize, Value};

/// Ordered mapping from parameter name to its values.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MultiValueStore {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiValueStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a form-urlencoded query string. A leading `?` is ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut store = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            store.append(key.into_owned(), value.into_owned());
        }
        store
    }

    /// Build a store from name/value pairs, normalizing every value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Normalization`] if any value cannot be normalized.
    pub fn from_mapping(mapping: &[(String, Value)], model_value_field: &str) -> Result<Self> {
        let mut store = Self::new();
        for (key, value) in mapping {
            for token in normalize(value, model_value_field)? {
                store.append(key.clone(), token);
            }
        }
        Ok(store)
    }

    /// Values for `key`, or an empty slice.
    #[must_use]
    pub fn get_list(&self, key: &str) -> &[String] {
        self.position(key)
            .map_or(&[] as &[String], |index| self.entries[index].1.as_slice())
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replace every value for `key`. An empty list removes the key.
    pub fn set_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        if values.is_empty() {
            self.remove(&key);
            return;
        }
        match self.position(&key) {
            Some(index) => self.entries[index].1 = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Append one value to `key`, creating the key at the end if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.entries[index].1.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Remove `key` and all of its values, returning them.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key)
            .map(|index| self.entries.remove(index).1)
    }

    /// Remove the first occurrence of `value` from `key`.
    ///
    /// Returns true if a value was removed. A key left without values is dropped.
    pub fn remove_value(&mut self, key: &str, value: &str) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        let values = &mut self.entries[index].1;
        let Some(at) = values.iter().position(|existing| existing == value) else {
            return false;
        };
        values.remove(at);
        if values.is_empty() {
            self.entries.remove(index);
        }
        true
    }

    /// Keep only the keys for which `keep` returns true.
    pub fn retain_keys<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|(key, _)| keep(key));
    }

    /// Keep only the values for which `keep` returns true, dropping keys left empty.
    pub fn retain_values<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        for (_, values) in &mut self.entries {
            values.retain(|value| keep(value));
        }
        self.entries.retain(|(_, values)| !values.is_empty());
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterate over `(key, values)` in order.
    pub fn lists(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Iterate over every `(key, value)` pair in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == key)
    }
}

impl<K, V> FromIterator<(K, V)> for MultiValueStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.append(key, value);
        }
        store
    }
}

/// Where the starting parameters of a render come from.
#[derive(Debug, Clone, Default)]
pub enum SourceData {
    /// No source; start empty
    #[default]
    Empty,
    /// Raw query string such as `?q=test&page=2`
    Query(String),
    /// Name/value pairs normalized with the call's `model_value_field`
    Mapping(Vec<(String, Value)>),
    /// Already parsed parameters
    Store(MultiValueStore),
}

impl SourceData {
    /// Build a fresh store for one render. The source itself is never mutated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Normalization`] if a mapping value cannot be normalized.
    pub fn to_store(&self, model_value_field: &str) -> Result<MultiValueStore> {
        match self {
            Self::Empty => Ok(MultiValueStore::new()),
            Self::Query(query) => Ok(MultiValueStore::from_query(query)),
            Self::Mapping(mapping) => MultiValueStore::from_mapping(mapping, model_value_field),
            Self::Store(store) => Ok(store.clone()),
        }
    }
}

impl TryFrom<Value> for SourceData {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::Str(query) => Ok(Self::Query(query)),
            Value::Mapping(mapping) => Ok(Self::Mapping(mapping)),
            other => Err(Error::UnsupportedSource(format!(
                "a {} cannot be used as source data",
                other.kind()
            ))),
        }
    }
}

impl From<MultiValueStore> for SourceData {
    fn from(store: MultiValueStore) -> Self {
        Self::Store(store)
    }
}

impl From<&str> for SourceData {
    fn from(query: &str) -> Self {
        Self::Query(query.to_string())
    }
}
