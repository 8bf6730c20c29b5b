use serde::{Deserialize, Serialize};

/// Closed set of value shapes the store accepts.
///
/// Every call site matches on the tag; there is no runtime type probing and
/// no coercion between variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl Value {
    /// True iff the variant tag is `Bool` and the value is `true`.
    /// This is not truthiness: `Int(1)` and `Str("true")` are both false here.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_true_requires_the_bool_tag() {
        assert!(Value::Bool(true).is_true());
        assert!(!Value::Bool(false).is_true());
        assert!(!Value::Int(1).is_true());
        assert!(!Value::Str("true".to_string()).is_true());
        assert!(!Value::Null.is_true());
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&Value::Int(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Value::Str("x".into())).unwrap(),
            "\"x\""
        );
    }
}
