//! JSON Patch (RFC 6902) documents used by every partial-update operation.
//!
//! # Design
//! `value` distinguishes "absent" from "explicitly null": `None` omits the
//! member, `Some(Value::Null)` sends `"value": null`. Deserialization keeps the
//! same distinction.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// One edit of a JSON Patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub value: Option<Value>,
}

impl JsonPatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_value(PatchOp::Add, path, value.into())
    }

    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_value(PatchOp::Replace, path, value.into())
    }

    pub fn test(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_value(PatchOp::Test, path, value.into())
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            from: None,
            value: None,
        }
    }

    pub fn move_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Move,
            path: path.into(),
            from: Some(from.into()),
            value: None,
        }
    }

    pub fn copy_from(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Copy,
            path: path.into(),
            from: Some(from.into()),
            value: None,
        }
    }

    fn with_value(op: PatchOp, path: impl Into<String>, value: Value) -> Self {
        Self {
            op,
            path: path.into(),
            from: None,
            value: Some(value),
        }
    }
}

/// JSON Pointer to a top-level member, escaping `~` and `/`.
pub fn field_pointer(field: &str) -> String {
    format!("/{}", field.replace('~', "~0").replace('/', "~1"))
}

/// Build `replace` operations for every field that is present.
///
/// Fields set to `Some(Value::Null)` are sent as explicit nulls.
pub fn replace_present<'a, I>(fields: I) -> Vec<JsonPatchOperation>
where
    I: IntoIterator<Item = (&'a str, Option<Value>)>,
{
    fields
        .into_iter()
        .filter_map(|(field, value)| {
            value.map(|value| JsonPatchOperation::replace(field_pointer(field), value))
        })
        .collect()
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_only_present_members() {
        let ops = vec![
            JsonPatchOperation::add("/tags/-", "finance"),
            JsonPatchOperation::replace("/description", Value::Null),
            JsonPatchOperation::remove("/managed_by"),
            JsonPatchOperation::move_from("/a", "/b"),
        ];
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"op": "add", "path": "/tags/-", "value": "finance"},
                {"op": "replace", "path": "/description", "value": null},
                {"op": "remove", "path": "/managed_by"},
                {"op": "move", "from": "/a", "path": "/b"}
            ])
        );
    }

    #[test]
    fn explicit_null_survives_deserialization() {
        let op: JsonPatchOperation =
            serde_json::from_str(r#"{"op":"replace","path":"/x","value":null}"#).unwrap();
        assert_eq!(op.value, Some(Value::Null));

        let op: JsonPatchOperation = serde_json::from_str(r#"{"op":"remove","path":"/x"}"#).unwrap();
        assert_eq!(op.value, None);
    }

    #[test]
    fn field_pointer_escapes() {
        assert_eq!(field_pointer("table_name"), "/table_name");
        assert_eq!(field_pointer("a/b~c"), "/a~1b~0c");
    }

    #[test]
    fn replace_present_skips_absent_fields() {
        let ops = replace_present([
            ("description", Some(json!("new"))),
            ("region", None),
            ("owner", Some(Value::Null)),
        ]);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].path, "/description");
        assert_eq!(ops[1].value, Some(Value::Null));
    }
}
