//! Raw event records and where they come from.
//! A record is an open field map; callers read it through typed accessors that treat
//! missing or ill-typed fields as absent instead of failing.

mod jsonl;
mod time;

pub use jsonl::JsonLinesSource;
pub use time::{day_of, parse_timestamp};

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

const RENDER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One primitive field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Wall-clock instant
    Timestamp(NaiveDateTime),
    /// Offset from 1970-01-01T00:00:00
    Offset(chrono::Duration),
}

impl FieldValue {
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::Str(s),
            other => FieldValue::Str(other.to_string()),
        }
    }

    /// Null, false, zero and "" are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Int(i) => *i != 0,
            FieldValue::Float(f) => *f != 0.0,
            FieldValue::Str(s) => !s.is_empty(),
            FieldValue::Timestamp(_) => true,
            FieldValue::Offset(d) => *d != chrono::Duration::zero(),
        }
    }

    /// String form used for tokens, domain checks and day buckets. `None` for null.
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Str(s) => Some(s.clone()),
            FieldValue::Timestamp(ts) => Some(ts.format(RENDER_FORMAT).to_string()),
            FieldValue::Offset(_) => parse_timestamp(self).map(|ts| ts.format(RENDER_FORMAT).to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(ts: NaiveDateTime) -> Self {
        FieldValue::Timestamp(ts)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::Timestamp(_) | FieldValue::Offset(_) => match self.render() {
                Some(s) => serializer.serialize_str(&s),
                None => serializer.serialize_none(),
            },
        }
    }
}

/// One raw event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Only JSON objects are records.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(Self {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from_json(v)))
                    .collect(),
            }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).map(FieldValue::is_truthy).unwrap_or(false)
    }

    /// Field rendered as a token; absent when missing or null.
    pub fn token(&self, key: &str) -> Option<String> {
        self.get(key).and_then(FieldValue::render)
    }

    /// Field parsed as a timestamp; absent when missing or unparseable.
    pub fn timestamp(&self, key: &str) -> Option<NaiveDateTime> {
        self.get(key).and_then(parse_timestamp)
    }

    /// Keep only `keys`; requested keys the record lacks become null.
    pub fn project<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Record {
        Record {
            fields: keys
                .into_iter()
                .map(|k| (k.clone(), self.get(k).cloned().unwrap_or(FieldValue::Null)))
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_becomes_record() {
        let r = Record::from_json(json!({"user_id": 7, "action_type": "BUY", "price": 1.5, "x": null}))
            .unwrap();
        assert_eq!(r.token("user_id").as_deref(), Some("7"));
        assert_eq!(r.token("action_type").as_deref(), Some("BUY"));
        assert_eq!(r.get("price"), Some(&FieldValue::Float(1.5)));
        assert_eq!(r.token("x"), None);
        assert_eq!(r.token("missing"), None);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(Record::from_json(json!([1, 2])).is_none());
        assert!(Record::from_json(json!("row")).is_none());
    }

    #[test]
    fn projection_fills_missing_with_null() {
        let r = Record::new().with("a", "1").with("b", "2");
        let keep: Vec<String> = vec!["a".into(), "c".into()];
        let p = r.project(&keep);
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("a"), Some(&FieldValue::from("1")));
        assert_eq!(p.get("c"), Some(&FieldValue::Null));
        assert!(p.get("b").is_none());
    }

    #[test]
    fn truthiness() {
        assert!(!FieldValue::Str(String::new()).is_truthy());
        assert!(!FieldValue::Null.is_truthy());
        assert!(!FieldValue::Int(0).is_truthy());
        assert!(FieldValue::from("x").is_truthy());
    }
}
