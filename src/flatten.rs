//! Flatten resolved values into dotted key-value pairs.

use serde_json::Value;

use crate::types::TYPE_TAG;

/// Flatten `value` into `(dotted.key, value)` pairs below `prefix`.
///
/// A record contributes its selected type at its own key, then one entry per
/// field. Dicts and lists of records recurse by key and index; every other
/// value, lists of scalars included, is a single entry.
///
/// `{ "__cls__": "Parent", "child": { "__cls__": "Child1", "p1": 0 } }` under
/// `root` → `[("root", "Parent"), ("root.child", "Child1"), ("root.child.p1", 0)]`
pub fn flatten(prefix: &str, value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    walk(prefix, value, &mut out);
    out
}

fn key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn is_record(value: &Value) -> bool {
    value.get(TYPE_TAG).is_some()
}

fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            if let Some(tag) = map.get(TYPE_TAG) {
                out.push((prefix.to_string(), tag.clone()));
            }
            for (name, field) in map {
                if name != TYPE_TAG {
                    walk(&key(prefix, name), field, out);
                }
            }
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(is_record) => {
            for (i, item) in items.iter().enumerate() {
                walk(&key(prefix, &i.to_string()), item, out);
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(pairs: &[(String, Value)]) -> Vec<&str> {
        pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn nested_records() {
        let value = json!({
            "__cls__": "Parent",
            "child": { "__cls__": "Child1", "p1": 0 }
        });
        let pairs = flatten("root", &value);
        assert_eq!(
            pairs,
            vec![
                ("root".to_string(), json!("Parent")),
                ("root.child".to_string(), json!("Child1")),
                ("root.child.p1".to_string(), json!(0)),
            ]
        );
    }

    #[test]
    fn lists_of_records_recurse_by_index() {
        let value = json!({
            "__cls__": "Bag",
            "items": [{ "__cls__": "Item", "v": 1 }],
            "ints": [1, 2],
            "empty": []
        });
        let pairs = flatten("bag", &value);
        assert_eq!(
            keys(&pairs),
            vec!["bag", "bag.items.0", "bag.items.0.v", "bag.ints", "bag.empty"]
        );
        assert_eq!(pairs[3].1, json!([1, 2]));
    }

    #[test]
    fn dicts_recurse_by_key_and_null_is_kept() {
        let value = json!({
            "subs": { "a": { "__cls__": "Sub1", "x": 0 } },
            "maybe": null
        });
        let pairs = flatten("", &value);
        assert_eq!(keys(&pairs), vec!["subs.a", "subs.a.x", "maybe"]);
        assert_eq!(pairs[2].1, Value::Null);
    }
}
