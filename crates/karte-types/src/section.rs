//! Canonical output sections of a generated summary.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Canonical section names, in output order.
pub const DEFAULT_SECTION_NAMES: [&str; 3] = ["治療経過", "特記事項", "備考"];

/// Heading aliases folded into a canonical section (alias, canonical).
pub const DEFAULT_SECTION_ALIASES: [(&str, &str); 4] = [
    ("治療内容", "治療経過"),
    ("その他", "備考"),
    ("補足", "備考"),
    ("メモ", "備考"),
];

/// Ordered mapping from canonical section name to its text.
///
/// Keys are fixed at construction and kept in canonical order; only values
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, String)>,
}

impl SectionMap {
    /// Create a map with every key pre-populated with an empty string.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for key in keys {
            let key = key.into();
            if !entries.iter().any(|(k, _)| *k == key) {
                entries.push((key, String::new()));
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Mutable access to an existing key. Unknown keys are never inserted.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SectionMap {
    fn default() -> Self {
        Self::with_keys(DEFAULT_SECTION_NAMES)
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
