use crate::error::{Error, ValidationError};
use crate::validation_helpers::build_validator;
use crate::violation::collect_violations;
use jsonschema::{Registry, Validator};
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

/// The scalar shape a raw parameter string is coerced into before
/// schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamKind>),
    Any,
}

impl ParamKind {
    /// Turns the raw occurrences of a parameter into a JSON value.
    ///
    /// Values that do not parse as the declared type stay strings so the
    /// schema reports the mismatch.
    pub fn coerce(&self, raw: &[String]) -> Value {
        match self {
            Self::Array(item) => {
                let parts: Vec<&str> = if raw.len() == 1 {
                    raw[0].split(',').collect()
                } else {
                    raw.iter().map(String::as_str).collect()
                };
                Value::Array(parts.into_iter().map(|p| item.coerce_one(p)).collect())
            }
            _ => raw
                .first()
                .map(|v| self.coerce_one(v))
                .unwrap_or(Value::Null),
        }
    }

    fn coerce_one(&self, raw: &str) -> Value {
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            Self::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            Self::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            Self::Array(item) => Value::Array(vec![item.coerce_one(raw)]),
            Self::String | Self::Any => Value::String(raw.to_string()),
        }
    }
}

/// Validator for a single parameter
#[derive(Debug)]
pub struct ParameterValidator {
    name: String,
    required: bool,
    kind: ParamKind,
    validator: Validator,
}

impl ParameterValidator {
    /// Creates validator with registry for $ref resolution
    pub fn new(
        name: String,
        required: bool,
        kind: ParamKind,
        schema: &Value,
        registry: &Registry,
    ) -> Result<Self, Error> {
        let validator = build_validator(schema, registry, &format!("parameter '{}'", name))?;
        Ok(Self {
            name,
            required,
            kind,
            validator,
        })
    }

    /// Coerces and validates the raw occurrences of this parameter.
    pub fn validate(
        &self,
        raw: &[String],
        location: ParameterLocation,
    ) -> Result<(), ValidationError> {
        let value = self.kind.coerce(raw);
        if self.validator.is_valid(&value) {
            return Ok(());
        }

        let details = collect_violations(&self.validator, &value, |pointer| {
            if pointer.is_empty() {
                self.name.clone()
            } else {
                format!("{}[{}]", self.name, pointer)
            }
        });
        Err(ValidationError::InvalidParameter {
            name: self.name.clone(),
            location: location.as_str(),
            details,
        })
    }

    /// Get the parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the parameter is required
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Raw parameter values keyed by name; repeated query keys keep every value.
pub type RawParams = HashMap<String, Vec<String>>;

/// Validator for all parameters of an operation
#[derive(Default, Debug)]
pub struct ParametersValidator {
    /// Path parameters (e.g., /users/{id})
    path: Vec<ParameterValidator>,
    /// Query parameters (e.g., ?page=1&limit=10)
    query: Vec<ParameterValidator>,
    /// Header parameters
    header: Vec<ParameterValidator>,
}

impl ParametersValidator {
    /// Create a new empty ParametersValidator
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, location: ParameterLocation, validator: ParameterValidator) {
        match location {
            ParameterLocation::Path => self.path.push(validator),
            ParameterLocation::Query => self.query.push(validator),
            ParameterLocation::Header => self.header.push(validator),
        }
    }

    /// Validate path parameters
    pub fn validate_path(&self, params: &RawParams) -> Result<(), ValidationError> {
        validate_parameters(&self.path, params, ParameterLocation::Path)
    }

    /// Validate query parameters
    pub fn validate_query(&self, params: &RawParams) -> Result<(), ValidationError> {
        validate_parameters(&self.query, params, ParameterLocation::Query)
    }

    /// Validate header parameters; `params` must be keyed by lowercase name.
    pub fn validate_headers(&self, params: &RawParams) -> Result<(), ValidationError> {
        for validator in &self.header {
            match params.get(&validator.name().to_ascii_lowercase()) {
                Some(values) => validator.validate(values, ParameterLocation::Header)?,
                None if validator.is_required() => {
                    return Err(missing(validator, ParameterLocation::Header))
                }
                None => {}
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.path.len() + self.query.len() + self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_parameters(
    validators: &[ParameterValidator],
    params: &RawParams,
    location: ParameterLocation,
) -> Result<(), ValidationError> {
    for validator in validators {
        match params.get(validator.name()) {
            Some(values) => validator.validate(values, location)?,
            None if validator.is_required() => return Err(missing(validator, location)),
            None => {}
        }
    }
    Ok(())
}

fn missing(validator: &ParameterValidator, location: ParameterLocation) -> ValidationError {
    ValidationError::MissingParameter {
        name: validator.name().to_string(),
        location: location.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_helpers::SPEC_BASE_URI;
    use serde_json::json;

    fn registry() -> Registry {
        let resource = jsonschema::Draft::Draft4.create_resource(json!({"components": {}}));
        Registry::try_new(SPEC_BASE_URI, resource).unwrap()
    }

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn coerces_scalars() {
        assert_eq!(ParamKind::Integer.coerce(&raw(&["42"])), json!(42));
        assert_eq!(ParamKind::Number.coerce(&raw(&["1.5"])), json!(1.5));
        assert_eq!(ParamKind::Boolean.coerce(&raw(&["true"])), json!(true));
        assert_eq!(ParamKind::Integer.coerce(&raw(&["abc"])), json!("abc"));
        assert_eq!(ParamKind::String.coerce(&raw(&["7"])), json!("7"));
    }

    #[test]
    fn coerces_arrays_from_commas_or_repetition() {
        let kind = ParamKind::Array(Box::new(ParamKind::Integer));
        assert_eq!(kind.coerce(&raw(&["1,2,3"])), json!([1, 2, 3]));
        assert_eq!(kind.coerce(&raw(&["1", "2"])), json!([1, 2]));
    }

    #[test]
    fn rejects_non_integer_path_parameter() {
        let validator = ParameterValidator::new(
            "id".to_string(),
            true,
            ParamKind::Integer,
            &json!({"type": "integer"}),
            &registry(),
        )
        .unwrap();
        let mut params = ParametersValidator::new();
        params.add(ParameterLocation::Path, validator);

        let mut ok = RawParams::new();
        ok.insert("id".to_string(), raw(&["12"]));
        assert!(params.validate_path(&ok).is_ok());

        let mut bad = RawParams::new();
        bad.insert("id".to_string(), raw(&["twelve"]));
        let err = params.validate_path(&bad).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParameter { location: "path", .. }));
        assert!(err.to_string().contains("TYPE_MISMATCH"));
    }

    #[test]
    fn missing_required_query_parameter() {
        let validator = ParameterValidator::new(
            "page".to_string(),
            true,
            ParamKind::Integer,
            &json!({"type": "integer"}),
            &registry(),
        )
        .unwrap();
        let mut params = ParametersValidator::new();
        params.add(ParameterLocation::Query, validator);

        let err = params.validate_query(&RawParams::new()).unwrap_err();
        assert_eq!(err.to_string(), "parameter \"page\" in query is required");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let validator = ParameterValidator::new(
            "X-Request-Id".to_string(),
            true,
            ParamKind::String,
            &json!({"type": "string", "minLength": 3}),
            &registry(),
        )
        .unwrap();
        let mut params = ParametersValidator::new();
        params.add(ParameterLocation::Header, validator);

        let mut headers = RawParams::new();
        headers.insert("x-request-id".to_string(), raw(&["abc123"]));
        assert!(params.validate_headers(&headers).is_ok());
    }
}
