use jsonschema::error::ValidationErrorKind;

/// Coarse classification of a JSON Schema failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    TypeMismatch,
    MissingRequired,
    EnumViolation,
    OneOfNoMatch,
    AnyOfNoMatch,
    ConstraintViolation,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::EnumViolation => "ENUM_VIOLATION",
            Self::OneOfNoMatch => "ONE_OF_NO_MATCH",
            Self::AnyOfNoMatch => "ANY_OF_NO_MATCH",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
        }
    }

    /// Maps a jsonschema error kind onto a violation kind.
    pub fn classify(kind: &ValidationErrorKind) -> Self {
        match kind {
            ValidationErrorKind::Type { .. } => Self::TypeMismatch,
            ValidationErrorKind::Required { .. } => Self::MissingRequired,
            ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => {
                Self::EnumViolation
            }
            ValidationErrorKind::OneOfNotValid { .. }
            | ValidationErrorKind::OneOfMultipleValid { .. } => Self::OneOfNoMatch,
            ValidationErrorKind::AnyOf { .. } => Self::AnyOfNoMatch,
            _ => Self::ConstraintViolation,
        }
    }
}

/// Renders one violation line: `[KIND] at <location> - <message>`.
pub fn format_violation(kind: ViolationKind, location: &str, message: &str) -> String {
    format!("[{}] at {} - {}", kind.as_str(), location, message)
}

/// Joins a JSON pointer onto a location prefix (`body` + `/name` → `body/name`).
pub fn format_instance_location(instance_path: &str, prefix: &str) -> String {
    if instance_path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, instance_path)
    }
}

/// Collects every failure of `value` against `validator` as violation lines.
///
/// `locate` turns the failing instance pointer into a location label.
pub fn collect_violations(
    validator: &jsonschema::Validator,
    value: &serde_json::Value,
    locate: impl Fn(&str) -> String,
) -> Vec<String> {
    validator
        .iter_errors(value)
        .map(|e| {
            let location = locate(&e.instance_path.to_string());
            format_violation(ViolationKind::classify(&e.kind), &location, &e.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_body_locations() {
        assert_eq!(format_instance_location("", "body"), "body");
        assert_eq!(format_instance_location("/name", "body"), "body/name");
    }

    #[test]
    fn collects_missing_required_property() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        let validator = jsonschema::validator_for(&schema).unwrap();

        let violations = collect_violations(&validator, &json!({"wrong": "field"}), |p| {
            format_instance_location(p, "body")
        });

        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("[MISSING_REQUIRED] at body - "));
        assert!(violations[0].contains("\"name\""));
    }

    #[test]
    fn classifies_type_mismatch_with_pointer() {
        let schema = json!({
            "type": "object",
            "properties": { "age": { "type": "integer" } }
        });
        let validator = jsonschema::validator_for(&schema).unwrap();

        let violations = collect_violations(&validator, &json!({"age": "ten"}), |p| {
            format_instance_location(p, "body")
        });

        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("[TYPE_MISMATCH] at body/age - "));
    }

    #[test]
    fn unknown_kinds_fall_back_to_constraint() {
        let schema = json!({ "type": "string", "minLength": 5 });
        let validator = jsonschema::validator_for(&schema).unwrap();

        let violations = collect_violations(&validator, &json!("abc"), |_| "q".to_string());

        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("[CONSTRAINT_VIOLATION] at q - "));
    }
}
