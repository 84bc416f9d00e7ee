use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single delta operation.
///
/// Mirrors the widget's JSON shape, e.g. `{"insert": "Hello", "attributes": {"bold": true}}`.
/// The `insert` payload is either a string or an embed object, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaOp {
    Insert {
        insert: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<Map<String, Value>>,
    },
    Retain {
        retain: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<Map<String, Value>>,
    },
    Delete {
        delete: u64,
    },
}

/// Rich-text document content as an ordered sequence of operations.
///
/// The session layer treats a delta as an opaque payload: it is stored, handed to the
/// widget and sent to the backend unchanged. The only question ever asked of it is
/// whether it is the empty-document sentinel (a single insert of a newline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub ops: Vec<DeltaOp>,
}

impl Delta {
    /// Create a delta from raw operations.
    pub fn from_ops(ops: Vec<DeltaOp>) -> Self {
        Self { ops }
    }

    /// The empty-document sentinel.
    pub fn sentinel() -> Self {
        Self {
            ops: vec![DeltaOp::Insert {
                insert: Value::String("\n".to_string()),
                attributes: None,
            }],
        }
    }

    /// Check whether this delta is the empty-document sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.ops.as_slice(),
            [DeltaOp::Insert { insert: Value::String(text), attributes: None }] if text == "\n"
        )
    }

    /// Append a plain-text insert.
    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.ops.push(DeltaOp::Insert {
            insert: Value::String(text.into()),
            attributes: None,
        });
        self
    }

    /// Append a formatted insert.
    pub fn insert_with(mut self, text: impl Into<String>, attributes: Map<String, Value>) -> Self {
        self.ops.push(DeltaOp::Insert {
            insert: Value::String(text.into()),
            attributes: Some(attributes),
        });
        self
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::sentinel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinel_detection() {
        assert!(Delta::sentinel().is_sentinel());
        assert!(Delta::default().is_sentinel());
        assert!(!Delta::from_ops(vec![]).is_sentinel());
        assert!(!Delta::from_ops(vec![]).insert("Hello\n").is_sentinel());
        assert!(!Delta::from_ops(vec![]).insert("\n").insert("\n").is_sentinel());

        // A formatted newline (e.g. a header line) is real content
        let mut attrs = Map::new();
        attrs.insert("header".to_string(), json!(1));
        assert!(!Delta::from_ops(vec![]).insert_with("\n", attrs).is_sentinel());
    }

    #[test]
    fn test_widget_json_shape() {
        let raw = json!({
            "ops": [
                {"insert": "Hello ", "attributes": {"bold": true}},
                {"insert": "world\n"},
                {"insert": {"image": "data:image/png;base64,AAAA"}},
                {"retain": 3, "attributes": {"italic": true}},
                {"delete": 2}
            ]
        });

        let delta: Delta = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(delta.ops.len(), 5);
        assert!(matches!(delta.ops[2], DeltaOp::Insert { ref insert, .. } if insert.is_object()));
        assert!(matches!(delta.ops[3], DeltaOp::Retain { retain: 3, attributes: Some(_) }));
        assert!(matches!(delta.ops[4], DeltaOp::Delete { delete: 2 }));

        // Passed through unchanged
        assert_eq!(serde_json::to_value(&delta).unwrap(), raw);
    }

    #[test]
    fn test_missing_ops_deserializes_empty() {
        let delta: Delta = serde_json::from_value(json!({})).unwrap();
        assert!(delta.ops.is_empty());
    }
}
