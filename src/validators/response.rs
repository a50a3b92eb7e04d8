use crate::error::{Error, ValidationError};
use crate::validators::body::{BodyCheck, BodyValidator};
use jsonschema::Registry;
use std::collections::HashMap;

/// Validator for response bodies against declared content per status code
#[derive(Debug, Default)]
pub struct ResponseValidator {
    exact: HashMap<u16, BodyValidator>,
    /// Keyed by status class (2 for `2XX`).
    ranges: HashMap<u16, BodyValidator>,
    default: Option<BodyValidator>,
}

impl ResponseValidator {
    /// Create a new empty ResponseValidator
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the declared content for a specific status code
    pub fn add_response(
        &mut self,
        status_code: u16,
        content: &openapiv3::Content,
        registry: &Registry,
    ) -> Result<(), Error> {
        let body =
            BodyValidator::from_content(content, registry, &format!("response {}", status_code))?;
        self.exact.insert(status_code, body);
        Ok(())
    }

    /// Adds the declared content for a status class such as `4XX`
    pub fn add_range(
        &mut self,
        class: u16,
        content: &openapiv3::Content,
        registry: &Registry,
    ) -> Result<(), Error> {
        let body =
            BodyValidator::from_content(content, registry, &format!("response {}XX", class))?;
        self.ranges.insert(class, body);
        Ok(())
    }

    /// Sets default response content for unmatched status codes
    pub fn set_default(
        &mut self,
        content: &openapiv3::Content,
        registry: &Registry,
    ) -> Result<(), Error> {
        self.default = Some(BodyValidator::from_content(
            content,
            registry,
            "default response",
        )?);
        Ok(())
    }

    /// Validates a response; statuses the operation does not declare pass.
    pub fn validate(
        &self,
        status_code: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(), ValidationError> {
        let Some(validator) = self
            .exact
            .get(&status_code)
            .or_else(|| self.ranges.get(&(status_code / 100)))
            .or(self.default.as_ref())
        else {
            return Ok(());
        };

        if validator.is_unconstrained() || body.is_empty() {
            return Ok(());
        }

        match validator.check(content_type, body, |details| ValidationError::ResponseBody {
            status: status_code,
            details,
        }) {
            BodyCheck::Valid => Ok(()),
            BodyCheck::UndeclaredMediaType(content_type) => {
                Err(ValidationError::ResponseMediaType {
                    status: status_code,
                    content_type,
                })
            }
            BodyCheck::Invalid(err) => Err(err),
        }
    }
}
