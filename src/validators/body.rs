use crate::error::{Error, ValidationError};
use crate::validation_helpers::build_validator;
use crate::violation::{collect_violations, format_instance_location};
use jsonschema::{Registry, Validator};
use mime::Mime;
use serde_json::Value;

/// One declared media type and its compiled schema, if any.
#[derive(Debug)]
struct MediaSchema {
    range: String,
    validator: Option<Validator>,
}

/// Outcome of checking a body against its declared content.
#[derive(Debug)]
pub enum BodyCheck {
    Valid,
    UndeclaredMediaType(String),
    Invalid(ValidationError),
}

/// Validates payloads against the `content` map of a request body or response.
#[derive(Debug, Default)]
pub struct BodyValidator {
    media: Vec<MediaSchema>,
}

impl BodyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a validator from an OpenAPI `content` map.
    pub fn from_content(
        content: &openapiv3::Content,
        registry: &Registry,
        context: &str,
    ) -> Result<Self, Error> {
        let mut body = Self::new();
        for (range, media_type) in content {
            let validator = match &media_type.schema {
                Some(schema) if is_json(range) => {
                    let schema_json = serde_json::to_value(schema).map_err(|e| {
                        Error::SchemaCompilation(format!(
                            "failed to convert {} schema to JSON: {}",
                            context, e
                        ))
                    })?;
                    Some(build_validator(
                        &schema_json,
                        registry,
                        &format!("{} ({})", context, range),
                    )?)
                }
                _ => None,
            };
            body.media.push(MediaSchema {
                range: range.to_ascii_lowercase(),
                validator,
            });
        }
        Ok(body)
    }

    /// True when no media type is declared, so any payload is acceptable.
    pub fn is_unconstrained(&self) -> bool {
        self.media.is_empty()
    }

    /// Checks `body` sent with `content_type` (None: header absent).
    ///
    /// `wrap` turns schema violation lines into the caller's error variant.
    pub fn check(
        &self,
        content_type: Option<&str>,
        body: &[u8],
        wrap: impl FnOnce(Vec<String>) -> ValidationError,
    ) -> BodyCheck {
        let Some(media) = self.select(content_type) else {
            return BodyCheck::UndeclaredMediaType(content_type.unwrap_or_default().to_string());
        };

        let Some(validator) = &media.validator else {
            return BodyCheck::Valid;
        };

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => return BodyCheck::Invalid(ValidationError::MalformedBody(e.to_string())),
        };

        if validator.is_valid(&value) {
            return BodyCheck::Valid;
        }
        let details = collect_violations(validator, &value, |pointer| {
            format_instance_location(pointer, "body")
        });
        BodyCheck::Invalid(wrap(details))
    }

    fn select(&self, content_type: Option<&str>) -> Option<&MediaSchema> {
        let Some(content_type) = content_type else {
            return self.media.first();
        };
        let essence = match content_type.parse::<Mime>() {
            Ok(mime) => mime.essence_str().to_string(),
            Err(_) => content_type
                .split(';')
                .next()
                .unwrap_or(content_type)
                .trim()
                .to_ascii_lowercase(),
        };
        let family = essence
            .split('/')
            .next()
            .map(|top| format!("{}/*", top))
            .unwrap_or_default();

        self.media
            .iter()
            .find(|m| m.range == essence)
            .or_else(|| self.media.iter().find(|m| m.range == family))
            .or_else(|| self.media.iter().find(|m| m.range == "*/*"))
    }
}

/// `application/json` and structured-syntax `+json` types.
pub fn is_json(range: &str) -> bool {
    let essence = range.split(';').next().unwrap_or(range).trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation_helpers::SPEC_BASE_URI;
    use openapiv3::{Content, MediaType};

    fn registry() -> Registry {
        let resource =
            jsonschema::Draft::Draft4.create_resource(serde_json::json!({"components": {}}));
        Registry::try_new(SPEC_BASE_URI, resource).unwrap()
    }

    fn content(yaml: &str) -> Content {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn wrap(details: Vec<String>) -> ValidationError {
        ValidationError::RequestBody { details }
    }

    #[test]
    fn detects_json_media_types() {
        assert!(is_json("application/json"));
        assert!(is_json("application/problem+json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(!is_json("text/plain"));
    }

    #[test]
    fn validates_json_against_schema() {
        let content = content(
            r#"
application/json:
  schema:
    type: object
    required: [name]
    properties:
      name: {type: string}
"#,
        );
        let body = BodyValidator::from_content(&content, &registry(), "request body").unwrap();

        assert!(matches!(
            body.check(Some("application/json"), br#"{"name":"x"}"#, wrap),
            BodyCheck::Valid
        ));
        assert!(matches!(
            body.check(Some("application/json; charset=utf-8"), br#"{"other":1}"#, wrap),
            BodyCheck::Invalid(ValidationError::RequestBody { .. })
        ));
        assert!(matches!(
            body.check(Some("application/json"), b"{not json", wrap),
            BodyCheck::Invalid(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn matches_wildcard_ranges_and_skips_opaque_payloads() {
        let mut content = Content::new();
        content.insert("image/*".to_string(), MediaType::default());
        let body = BodyValidator::from_content(&content, &registry(), "request body").unwrap();

        assert!(matches!(
            body.check(Some("image/png"), b"\x89PNG", wrap),
            BodyCheck::Valid
        ));
        assert!(matches!(
            body.check(Some("text/plain"), b"hi", wrap),
            BodyCheck::UndeclaredMediaType(ct) if ct == "text/plain"
        ));
    }

    #[test]
    fn missing_content_type_uses_first_declared() {
        let content = content(
            r#"
application/json:
  schema: {type: array}
"#,
        );
        let body = BodyValidator::from_content(&content, &registry(), "request body").unwrap();

        assert!(matches!(body.check(None, b"[1,2]", wrap), BodyCheck::Valid));
        assert!(matches!(
            body.check(None, b"{}", wrap),
            BodyCheck::Invalid(ValidationError::RequestBody { .. })
        ));
    }
}
