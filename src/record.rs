use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::Field;

/// One decoded row: column label to text value.
///
/// Keys are whatever columns the source carried. Key order is not significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

/// Records from one decode pass, in source order.
pub type RecordCollection = Vec<Record>;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a known field, `None` when the column is absent.
    pub fn field(&self, field: Field) -> Option<&str> {
        self.get(field.label())
    }

    /// Value of a known field, empty text when the column is absent.
    pub fn field_or_empty(&self, field: Field) -> &str {
        self.field(field).unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Option<String> {
        self.insert(field.label(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Employee number, the identifying column.
    pub fn employee_id(&self) -> Option<&str> {
        self.field(Field::EmployeeNumber)
    }

    /// Required fields that are absent or blank, by label.
    pub fn missing_required(&self) -> Vec<&'static str> {
        Field::REQUIRED
            .iter()
            .filter(|f| self.field(**f).map_or(true, |v| v.trim().is_empty()))
            .map(|f| f.label())
            .collect()
    }

    /// Projects onto the known field allow-list, dropping unknown columns.
    pub fn known_fields(&self) -> BTreeMap<Field, &str> {
        self.0
            .iter()
            .filter_map(|(k, v)| Field::from_label(k).map(|f| (f, v.as_str())))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
