use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Largest magnitude at which every integer is exactly representable in an `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Key/value content of a block. Keys are kept sorted, so two payloads with the
/// same entries always serialize to the same bytes.
pub type Payload = BTreeMap<String, Value>;

/// A single payload value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(Payload),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            // 10.0 goes out as `10`, the way the client sent it
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Map(m) => m.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Payload> for Value {
    fn from(m: Payload) -> Self {
        Value::Map(m)
    }
}

/// Build the `{from, to, amount}` mapping carried by a transfer block.
pub fn transfer(from: &str, to: &str, amount: f64) -> Payload {
    let mut data = Payload::new();
    data.insert("from".into(), Value::from(from));
    data.insert("to".into(), Value::from(to));
    data.insert("amount".into(), Value::from(amount));
    data
}

/// Canonical JSON form of a payload, as fed into the block hash.
pub fn canonical_json(data: &Payload) -> String {
    // String keys and plain values: serialization into a String cannot fail.
    serde_json::to_string(data).expect("payload serializes")
}
