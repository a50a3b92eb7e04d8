use crate::error::{Error, ValidationError};
use crate::validators::body::{BodyCheck, BodyValidator};
use jsonschema::Registry;

/// Validator for request body against the operation's declared content
#[derive(Debug)]
pub struct RequestBodyValidator {
    body: BodyValidator,
    required: bool,
}

impl RequestBodyValidator {
    /// Creates validator with registry for $ref resolution
    pub fn new(
        content: &openapiv3::Content,
        required: bool,
        registry: &Registry,
    ) -> Result<Self, Error> {
        let body = BodyValidator::from_content(content, registry, "request body")?;
        Ok(Self { body, required })
    }

    /// Validates request body against schema; an empty slice means no body.
    pub fn validate(&self, content_type: Option<&str>, body: &[u8]) -> Result<(), ValidationError> {
        if body.is_empty() {
            return if self.required {
                Err(ValidationError::MissingRequestBody)
            } else {
                Ok(())
            };
        }

        if self.body.is_unconstrained() {
            return Ok(());
        }

        match self
            .body
            .check(content_type, body, |details| ValidationError::RequestBody { details })
        {
            BodyCheck::Valid => Ok(()),
            BodyCheck::UndeclaredMediaType(ct) => Err(ValidationError::UnsupportedMediaType(ct)),
            BodyCheck::Invalid(err) => Err(err),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_helpers::SPEC_BASE_URI;

    fn validator(required: bool) -> RequestBodyValidator {
        let content: openapiv3::Content = serde_yaml::from_str(
            r#"
application/json:
  schema:
    type: object
    required: [name]
    properties:
      name: {type: string}
"#,
        )
        .unwrap();
        let resource =
            jsonschema::Draft::Draft4.create_resource(serde_json::json!({"components": {}}));
        let registry = Registry::try_new(SPEC_BASE_URI, resource).unwrap();
        RequestBodyValidator::new(&content, required, &registry).unwrap()
    }

    #[test]
    fn required_body_must_be_present() {
        let err = validator(true).validate(Some("application/json"), b"").unwrap_err();
        assert_eq!(err, ValidationError::MissingRequestBody);
    }

    #[test]
    fn optional_body_may_be_absent() {
        assert!(validator(false).validate(None, b"").is_ok());
    }

    #[test]
    fn reports_missing_property() {
        let err = validator(true)
            .validate(Some("application/json"), br#"{"wrong":"field"}"#)
            .unwrap_err();
        let ValidationError::RequestBody { details } = err else {
            panic!("unexpected error");
        };
        assert!(details[0].contains("MISSING_REQUIRED"));
        assert!(details[0].contains("\"name\" is a required property"));
    }

    #[test]
    fn rejects_undeclared_media_type() {
        let err = validator(true).validate(Some("text/plain"), b"name").unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedMediaType("text/plain".to_string()));
    }
}
