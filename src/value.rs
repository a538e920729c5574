//! A self-describing sum-typed value tree.
//!
//! The wire format's "property tree" (free-form entity tags) and the
//! in-memory attribute bag each entity variant decoder fills in share the
//! same shape, so both are represented by one [`Value`] type rather than
//! two near-identical ones. Reading it off the wire is in
//! `codec::fields::read_property_tree`; everything else (variant decoders,
//! the link resolver) only ever builds or walks it in memory.

use indexmap::IndexMap;
use serde::Serialize;

/// Ordered string-keyed map, preserving insertion order so the JSON output
/// reads in the same field order the game itself would emit.
pub type Dict = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn dict() -> Self {
        Value::Dict(Dict::new())
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_f64().map(|n| n as u32)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Convenience helper: insert `key` into `dict` unless `value` is the given
/// family's documented default, mirroring the export's suppression rules
/// (SPEC_FULL.md §4.C/§4.D).
pub fn insert_unless<T: Into<Value> + PartialEq + Clone>(
    dict: &mut Dict,
    key: &str,
    value: T,
    default: T,
) {
    if value != default {
        dict.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_preserves_insertion_order() {
        let mut d = Dict::new();
        d.insert("b".into(), Value::Number(2.0));
        d.insert("a".into(), Value::Number(1.0));
        let keys: Vec<_> = d.keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn serializes_as_plain_json_shapes() {
        let mut d = Dict::new();
        d.insert("name".into(), Value::String("iron-chest".into()));
        d.insert("count".into(), Value::Number(5.0));
        let v = Value::Dict(d);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"name":"iron-chest","count":5.0}"#);
    }
}
