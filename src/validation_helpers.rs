use crate::error::Error;
use jsonschema::{Draft, Registry, Validator};
use serde_json::{Map, Value};

/// Base URI the components registry is published under.
pub const SPEC_BASE_URI: &str = "urn:oas:spec";

/// Builds a JSON Schema validator with registry for $ref resolution
pub fn build_validator(
    schema: &Value,
    registry: &Registry,
    error_context: &str,
) -> Result<Validator, Error> {
    let schema = normalize_schema(schema.clone());
    jsonschema::options()
        .with_draft(Draft::Draft4)
        .with_registry(registry.clone())
        .with_base_uri(SPEC_BASE_URI.to_string())
        .build(&schema)
        .map_err(|e| {
            Error::SchemaCompilation(format!(
                "failed to compile schema for {}: {}",
                error_context, e
            ))
        })
}

/// Rewrites OAS 3.0 keywords that JSON Schema does not understand.
///
/// `nullable: true` becomes a `null` member of `type`.
pub fn normalize_schema(schema: Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(normalize_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_schema).collect()),
        other => other,
    }
}

fn normalize_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out: Map<String, Value> = map
        .into_iter()
        .map(|(key, value)| (key, normalize_schema(value)))
        .collect();

    let nullable = match out.get("nullable") {
        Some(Value::Bool(flag)) => Some(*flag),
        _ => None,
    };
    if nullable.is_some() {
        out.remove("nullable");
    }

    if nullable == Some(true) {
        match out.get_mut("type") {
            Some(Value::String(ty)) => {
                let ty = std::mem::take(ty);
                out.insert(
                    "type".to_string(),
                    Value::Array(vec![Value::String(ty), Value::String("null".to_string())]),
                );
            }
            Some(Value::Array(types)) => {
                if !types.iter().any(|t| t == "null") {
                    types.push(Value::String("null".to_string()));
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nullable_string_admits_null() {
        let schema = normalize_schema(json!({"type": "string", "nullable": true}));
        assert_eq!(schema, json!({"type": ["string", "null"]}));
    }

    #[test]
    fn nullable_false_is_dropped() {
        let schema = normalize_schema(json!({"type": "integer", "nullable": false}));
        assert_eq!(schema, json!({"type": "integer"}));
    }

    #[test]
    fn nested_properties_are_rewritten() {
        let schema = normalize_schema(json!({
            "type": "object",
            "properties": { "nick": { "type": "string", "nullable": true } }
        }));
        assert_eq!(schema["properties"]["nick"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn properties_named_nullable_are_kept() {
        let schema = normalize_schema(json!({
            "type": "object",
            "properties": { "nullable": { "type": "boolean" } }
        }));
        assert_eq!(schema["properties"]["nullable"], json!({"type": "boolean"}));
    }
}
