//! Record and dataset data structures.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keys a Record serializes itself; never used for extracted fields.
pub const RESERVED_KEYS: [&str; 4] = ["id", "name", "url", "missing"];

/// Ordered mapping from identifier to Record.
pub type Dataset = IndexMap<String, Record>;

/// A field value: scalar text or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Scalar text, if this value is not a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// List items, if this value is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// One crawled entity.
///
/// Serializes flat: `id`, `name`, `url`, every field in order, then `missing`.
/// Field names are whatever the source page used; there is no fixed schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical slug. Filled from the dataset key when absent on disk.
    #[serde(default)]
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Source page URL
    #[serde(default)]
    pub url: String,

    /// Extracted fields in document order
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,

    /// Tags for data the extractor expected but could not find
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl Record {
    /// Create an empty Record.
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            fields: IndexMap::new(),
            missing: Vec::new(),
        }
    }

    /// Create a stub Record carrying only identity and one missing-tag.
    pub fn stub(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(id, name, url);
        record.add_missing(tag);
        record
    }

    /// Name to show for this Record, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Insert a field, keeping the position of an existing key.
    ///
    /// Reserved keys are renamed to `"<key> (field)"` so they cannot shadow
    /// the Record's own identity on disk.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(Self::field_key(key), value.into());
    }

    /// The key a field is stored under: reserved keys get a ` (field)` suffix.
    pub fn field_key(key: impl Into<String>) -> String {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            format!("{key} (field)")
        } else {
            key
        }
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Add a missing-tag; duplicates are ignored.
    pub fn add_missing(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.missing.contains(&tag) {
            self.missing.push(tag);
        }
    }

    /// True when the Record holds no extracted fields.
    pub fn is_stub(&self) -> bool {
        self.fields.is_empty() && !self.missing.is_empty()
    }
}

/// Fill empty `id`s from dataset keys (files written before ids were stored).
pub fn fill_ids(dataset: &mut Dataset) {
    for (key, record) in dataset.iter_mut() {
        if record.id.is_empty() {
            record.id = key.clone();
        }
    }
}
