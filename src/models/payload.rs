//! Request payload shapes accepted by the signer.
//!
//! Payloads reach the signer from query strings, form bodies and JSON-like
//! maps. `FormData` accepts all of those shapes and keeps entries in the
//! order they were supplied; canonical ordering is applied only when the
//! payload is encoded for signing.

use crate::error::SignerError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use url::form_urlencoded;

/// A single field value or a list of values for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Iterate over every value held by this field.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::Multi(values) => values,
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Single(value.clone())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldValue {
    fn from(values: [&str; N]) -> Self {
        FieldValue::Multi(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Ordered collection of `(key, value)` entries, duplicates allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FieldValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping any earlier entries for the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder-style `append`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.append(key, value);
        self
    }

    /// Drop every entry for `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// First entry stored for `key`.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn entries(&self) -> &[(String, FieldValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapse the entries into a multimap with keys and values sorted.
    ///
    /// Repeated keys are concatenated before sorting, so a key supplied as
    /// several scalar entries and a key supplied once with a list encode the
    /// same way.
    pub fn canonical(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &self.entries {
            fields
                .entry(key.clone())
                .or_default()
                .extend(value.values().map(str::to_string));
        }
        for values in fields.values_mut() {
            values.sort();
        }
        fields
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Blank values are kept; a body field sent as `name=` is still part of
    /// what the client signed.
    pub fn parse(encoded: &[u8]) -> Self {
        form_urlencoded::parse(encoded)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Flatten a JSON object of scalars and scalar arrays into form fields.
    pub fn from_json(value: &Value) -> Result<Self, SignerError> {
        let object = value.as_object().ok_or_else(|| SignerError::EncodingAmbiguity {
            message: "payload must be a JSON object".to_string(),
        })?;

        let mut data = FormData::new();
        for (key, value) in object {
            match value {
                Value::Array(items) => {
                    let values = items
                        .iter()
                        .map(|item| json_scalar(key, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    data.append(key.clone(), FieldValue::Multi(values));
                }
                other => data.append(key.clone(), json_scalar(key, other)?),
            }
        }
        Ok(data)
    }

    /// Render the fields as a JSON object for JSON request bodies.
    ///
    /// A key with exactly one scalar value becomes a string, anything else
    /// becomes an array in supplied order.
    pub fn to_json(&self) -> Value {
        let mut grouped: Vec<(&str, Vec<&str>, bool)> = Vec::new();
        for (key, value) in &self.entries {
            let is_list = matches!(value, FieldValue::Multi(_));
            match grouped.iter_mut().find(|(k, _, _)| *k == key.as_str()) {
                Some((_, values, list)) => {
                    values.extend(value.values());
                    *list = true;
                }
                None => grouped.push((key.as_str(), value.values().collect(), is_list)),
            }
        }

        let mut object = Map::new();
        for (key, values, is_list) in grouped {
            let rendered = match (is_list, values.as_slice()) {
                (false, [single]) => Value::String(single.to_string()),
                _ => Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect()),
            };
            object.insert(key.to_string(), rendered);
        }
        Value::Object(object)
    }
}

fn json_scalar(key: &str, value: &Value) -> Result<String, SignerError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(SignerError::EncodingAmbiguity {
            message: format!("field `{key}` holds a value with no form encoding"),
        }),
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> From<HashMap<K, V>> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(map: HashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> From<BTreeMap<K, V>> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

/// What gets appended to the signable URL before computing the HMAC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// No payload; contributes the empty string.
    #[default]
    Empty,
    /// Field data, canonically form-encoded before signing.
    Form(FormData),
    /// Literal body bytes (JSON bodies), signed as sent.
    Raw(Vec<u8>),
}

impl Payload {
    pub fn raw(body: impl Into<Vec<u8>>) -> Self {
        Payload::Raw(body.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Form(data) => data.is_empty(),
            Payload::Raw(bytes) => bytes.is_empty(),
        }
    }
}

impl From<FormData> for Payload {
    fn from(data: FormData) -> Self {
        Payload::Form(data)
    }
}

impl From<Option<FormData>> for Payload {
    fn from(data: Option<FormData>) -> Self {
        data.map_or(Payload::Empty, Payload::Form)
    }
}
