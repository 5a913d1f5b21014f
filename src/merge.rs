use serde_json::{Map, Value};

/// Fill the keys of `target` that are still missing from `defaults`.
/// Keys already in `target` win; a key is only copied when `accept` says the
/// target type declares it.
pub fn fill_missing(
    target: &mut Map<String, Value>,
    defaults: &Map<String, Value>,
    accept: impl Fn(&str) -> bool,
) {
    for (key, value) in defaults {
        if target.contains_key(key) || !accept(key) {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn disjoint_keys_merge() {
        let mut target = map(json!({ "p1": 1 }));
        fill_missing(&mut target, &map(json!({ "p2": "x" })), |_| true);
        assert_eq!(Value::Object(target), json!({ "p1": 1, "p2": "x" }));
    }

    #[test]
    fn existing_key_wins() {
        let mut target = map(json!({ "p1": 1 }));
        fill_missing(&mut target, &map(json!({ "p1": 5 })), |_| true);
        assert_eq!(target["p1"], json!(1));
    }

    #[test]
    fn explicit_null_is_kept() {
        let mut target = map(json!({ "child": null }));
        fill_missing(&mut target, &map(json!({ "child": { "p1": 0 } })), |_| true);
        assert_eq!(target["child"], Value::Null);
    }

    #[test]
    fn unknown_fields_are_not_copied() {
        let mut target = Map::new();
        fill_missing(
            &mut target,
            &map(json!({ "p1": 1, "__cls__": "Child1", "gone": true })),
            |key| key == "p1",
        );
        assert_eq!(Value::Object(target), json!({ "p1": 1 }));
    }
}
