//! Shape checks on submitted JSON-LD objects, run before any store access.

use crate::error::CrudError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Deepest nesting of objects and arrays accepted in one submission.
pub const MAX_DEPTH: usize = 16;

/// Keywords accepted on a submitted object. Only `@type` carries meaning;
/// `@id` and `@context` are tolerated so fetched documents can be resubmitted.
const KEYWORDS: &[&str] = &["@type", "@id", "@context"];

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._~-]{1,128}$").expect("static pattern"))
}

pub struct ObjectValidator;

impl ObjectValidator {
    /// Validate a top-level instance object: a JSON object with a string `@type`.
    pub fn validate(object: &Value) -> Result<(), CrudError> {
        validate_instance(object, 0)
    }

    /// Caller-supplied ids end up in URLs, so they must be one plain path segment.
    pub fn validate_id(id: &str) -> Result<(), CrudError> {
        if id_pattern().is_match(id) {
            Ok(())
        } else {
            Err(CrudError::Malformed(format!("invalid instance id: {:?}", id)))
        }
    }
}

fn validate_instance(object: &Value, depth: usize) -> Result<(), CrudError> {
    if depth > MAX_DEPTH {
        return Err(CrudError::Malformed(format!("object nesting deeper than {}", MAX_DEPTH)));
    }
    let map = object
        .as_object()
        .ok_or_else(|| CrudError::Malformed("instance must be a JSON object".into()))?;
    match map.get("@type") {
        Some(Value::String(t)) if !t.is_empty() => {}
        Some(_) => return Err(CrudError::Malformed("@type must be a non-empty string".into())),
        None => return Err(CrudError::Malformed("@type is required".into())),
    }
    for (key, value) in map {
        if key.is_empty() {
            return Err(CrudError::Malformed("property names must not be empty".into()));
        }
        if key.starts_with('@') {
            if !KEYWORDS.contains(&key.as_str()) {
                return Err(CrudError::Malformed(format!("unsupported keyword: {}", key)));
            }
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    if item.is_array() {
                        return Err(CrudError::Malformed(format!("{}: nested arrays are not supported", key)));
                    }
                    validate_value(key, item, depth + 1)?;
                }
            }
            other => validate_value(key, other, depth + 1)?,
        }
    }
    Ok(())
}

fn validate_value(key: &str, value: &Value, depth: usize) -> Result<(), CrudError> {
    let Some(map) = value.as_object() else {
        return Ok(());
    };
    if map.contains_key("@type") {
        return validate_instance(value, depth);
    }
    match map.get("@id") {
        Some(Value::String(_)) if map.len() == 1 => Ok(()),
        Some(Value::String(_)) => Err(CrudError::Malformed(format!(
            "{}: an @id reference must not carry other keys",
            key
        ))),
        _ => Err(CrudError::Malformed(format!(
            "{}: nested objects need @type or an @id reference",
            key
        ))),
    }
}

/// Class and id named by an `@id` reference. A bare `"7"` names only the id;
/// a path such as `"/api/Drone/7"` also names the class `Drone`.
pub fn reference_target(reference: &str) -> (Option<&str>, &str) {
    let mut segments = reference.trim_end_matches('/').rsplit('/');
    let id = segments.next().unwrap_or(reference);
    let class_name = segments.next().filter(|c| !c.is_empty());
    (class_name, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_nested_instances_and_references() {
        let obj = json!({
            "@type": "Drone",
            "name": "d1",
            "DroneState": {"@type": "State", "Speed": 3},
            "peers": [{"@id": "/api/Drone/2"}, "3"],
        });
        ObjectValidator::validate(&obj).unwrap();
    }

    #[test]
    fn rejects_missing_type_and_bad_keywords() {
        assert!(ObjectValidator::validate(&json!({"name": "x"})).is_err());
        assert!(ObjectValidator::validate(&json!({"@type": 3})).is_err());
        assert!(ObjectValidator::validate(&json!({"@type": "A", "@graph": []})).is_err());
        assert!(ObjectValidator::validate(&json!(["@type"])).is_err());
    }

    #[test]
    fn rejects_untyped_nested_objects() {
        let err = ObjectValidator::validate(&json!({"@type": "A", "p": {"x": 1}})).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(ObjectValidator::validate(&json!({"@type": "A", "p": {"@id": "1", "x": 1}})).is_err());
        assert!(ObjectValidator::validate(&json!({"@type": "A", "p": [[1]]})).is_err());
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut obj = json!({"@type": "A"});
        for _ in 0..=MAX_DEPTH {
            obj = json!({"@type": "A", "child": obj});
        }
        assert!(ObjectValidator::validate(&obj).is_err());
    }

    #[test]
    fn ids_are_single_path_segments() {
        ObjectValidator::validate_id("drone-7").unwrap();
        ObjectValidator::validate_id("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(ObjectValidator::validate_id("a/b").is_err());
        assert!(ObjectValidator::validate_id("").is_err());
    }

    #[test]
    fn reference_target_splits_class_and_id() {
        assert_eq!(reference_target("/api/Drone/7"), (Some("Drone"), "7"));
        assert_eq!(reference_target("/api/Drone/7/"), (Some("Drone"), "7"));
        assert_eq!(reference_target("Drone/7"), (Some("Drone"), "7"));
        assert_eq!(reference_target("/7"), (None, "7"));
        assert_eq!(reference_target("7"), (None, "7"));
    }
}
