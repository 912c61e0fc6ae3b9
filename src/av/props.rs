use super::Fraction;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Binary subsample table: N records of
/// `[flags u32][size u32][reserved u32][priority u8][discardable u8]`.
pub const PROP_SUBSAMPLES: &str = "subs";
/// File number marker; a packet carrying it starts a new output file.
pub const PROP_FILE_NUMBER: &str = "filenum";
/// WebVTT cue identifier line.
pub const PROP_CUE_ID: &str = "vtt_cueid";
/// WebVTT cue settings appended after the timing line.
pub const PROP_CUE_SETTINGS: &str = "vtt_settings";

/// A typed packet or port property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Uint(u64),
    Str(String),
    Data(Bytes),
    Fraction(Fraction),
}

/// Named, ordered property set attached to packets and ports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(PropertyValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_data(&self, name: &str) -> Option<&Bytes> {
        match self.entries.get(name) {
            Some(PropertyValue::Data(d)) => Some(d),
            _ => None,
        }
    }

    pub fn get_uint(&self, name: &str) -> Option<u64> {
        match self.entries.get(name) {
            Some(PropertyValue::Uint(v)) => Some(*v),
            _ => None,
        }
    }

    /// Copies every entry of `other`, overwriting existing names.
    pub fn merge(&mut self, other: &Properties) {
        for (name, value) in &other.entries {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
