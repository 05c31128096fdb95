//! Response demultiplexing: fold `name__N` keys back into `name: [...]`.
//!
//! Repeat expansion turns one declared field into aliased copies
//! (`items__0`, `items__1`, ...). Before the response can be decoded into the
//! declared shape, those copies have to become one list again, in index order.
use serde_json::{Map, Value};

use crate::compile::REPETITION_SEPARATOR;
use crate::error::{json_kind, Error, Result};

/// Position of a folded item. Numeric suffixes sort numerically and come
/// before any non-numeric suffix, which sort lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Suffix {
    Index(u64),
    Other(String),
}

impl Suffix {
    fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(i) => Suffix::Index(i),
            Err(_) => Suffix::Other(s.to_string()),
        }
    }
}

/// Split `items__3` into (`items`, `3`). Keys that start with the separator
/// (`__typename`) are GraphQL meta fields, not repetitions.
pub fn split_repetition_key(key: &str) -> Option<(&str, &str)> {
    match key.find(REPETITION_SEPARATOR) {
        Some(0) | None => None,
        Some(i) => Some((&key[..i], &key[i + REPETITION_SEPARATOR.len()..])),
    }
}

/// Fold every repetition key of `raw` (and of the objects nested below it)
/// into a list under its un-suffixed key.
pub fn fold_repetitions(raw: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut out = Map::with_capacity(raw.len());
    let mut repeated: Vec<(Suffix, String, Value)> = Vec::new();

    for (key, value) in raw {
        let value = fold_value(value)?;
        match split_repetition_key(&key) {
            Some((target, suffix)) => repeated.push((Suffix::parse(suffix), target.to_string(), value)),
            None => {
                out.insert(key, value);
            }
        }
    }
    if repeated.is_empty() {
        return Ok(out);
    }

    // source order is arbitrary; list order must follow the index
    repeated.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::trace!(count = repeated.len(), "folding repeated fields");

    for (_, target, value) in repeated {
        match out.get_mut(&target) {
            None => {
                out.insert(target, Value::Array(vec![value]));
            }
            Some(Value::Array(items)) => items.push(value),
            Some(_) => return Err(Error::FoldCollision { key: target }),
        }
    }
    Ok(out)
}

fn fold_value(value: Value) -> Result<Value> {
    match value {
        Value::Object(map) => fold_repetitions(map).map(Value::Object),
        Value::Array(items) => items
            .into_iter()
            .map(fold_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Fold a response `data` payload. `null` passes through; anything other
/// than an object or null cannot be a GraphQL result.
pub fn fold_data(data: Value) -> Result<Value> {
    match data {
        Value::Object(map) => fold_repetitions(map).map(Value::Object),
        Value::Null => Ok(Value::Null),
        other => Err(Error::NotAnObject { found: json_kind(&other) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fold(v: Value) -> Value {
        fold_data(v).unwrap()
    }

    #[test]
    fn repeated_keys_fold_into_a_list() {
        let raw = json!({"items__0": {"id": 1}, "items__1": {"id": 2}, "title": "x"});
        assert_eq!(fold(raw), json!({"title": "x", "items": [{"id": 1}, {"id": 2}]}));
    }

    #[test]
    fn index_order_wins_over_source_order() {
        // 10 must land after 2, not between 1 and 2
        let raw = json!({
            "n__10": 10, "n__2": 2, "n__0": 0, "n__1": 1,
            "n__3": 3, "n__4": 4, "n__5": 5, "n__6": 6, "n__7": 7, "n__8": 8, "n__9": 9,
        });
        assert_eq!(fold(raw), json!({"n": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]}));
    }

    #[test]
    fn every_repetition_count_round_trips() {
        for n in 0..12usize {
            let mut raw = Map::new();
            for i in (0..n).rev() {
                raw.insert(format!("items__{i}"), json!({"id": i}));
            }
            raw.insert("title".into(), json!("t"));
            let folded = fold_repetitions(raw).unwrap();
            match folded.get("items") {
                None => assert_eq!(n, 0),
                Some(Value::Array(items)) => {
                    assert_eq!(items.len(), n);
                    for (i, item) in items.iter().enumerate() {
                        assert_eq!(item["id"], json!(i));
                    }
                }
                Some(other) => panic!("unexpected {other}"),
            }
        }
    }

    #[test]
    fn objects_without_repetitions_are_unchanged() {
        let raw = json!({"viewer": {"login": "octocat", "__typename": "User"}, "a": [1, {"b": null}]});
        assert_eq!(fold(raw.clone()), raw);
        assert_eq!(fold(Value::Null), Value::Null);
    }

    #[test]
    fn nested_repetitions_fold_too() {
        let raw = json!({"users": [
            {"login": "a", "posts__1": {"id": "p2"}, "posts__0": {"id": "p1"}},
            {"login": "b"}
        ]});
        assert_eq!(fold(raw), json!({"users": [
            {"login": "a", "posts": [{"id": "p1"}, {"id": "p2"}]},
            {"login": "b"}
        ]}));
    }

    #[test]
    fn existing_lists_are_extended() {
        let raw = json!({"items": [{"id": 0}], "items__0": {"id": 1}});
        assert_eq!(fold(raw), json!({"items": [{"id": 0}, {"id": 1}]}));
    }

    #[test]
    fn non_list_targets_are_rejected() {
        let raw = json!({"items": "scalar", "items__0": {"id": 1}});
        let err = fold_data(raw).unwrap_err();
        assert!(matches!(err, Error::FoldCollision { ref key } if key == "items"));

        assert!(matches!(fold_data(json!([1])), Err(Error::NotAnObject { found: "array" })));
    }

    #[test]
    fn split_keys() {
        assert_eq!(split_repetition_key("items__3"), Some(("items", "3")));
        assert_eq!(split_repetition_key("a__b__c"), Some(("a", "b__c")));
        assert_eq!(split_repetition_key("__typename"), None);
        assert_eq!(split_repetition_key("plain"), None);
    }
}
