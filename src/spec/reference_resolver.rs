use crate::error::Error;
use openapiv3::{Components, OpenAPI, ReferenceOr};

/// Resolves OpenAPI structure-level $ref to actual component definitions
///
/// This trait handles references to OpenAPI components like:
/// - `$ref: "#/components/parameters/PageLimit"`
/// - `$ref: "#/components/requestBodies/CreateUser"`
/// - `$ref: "#/components/responses/ErrorResponse"`
///
/// Schema references inside those objects are left to the `jsonschema`
/// registry built from the components section.
pub trait ResolveReference<T> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a T, Error>;
}

fn resolve_logic<'a, T, F>(
    ref_or: &'a ReferenceOr<T>,
    spec: &'a OpenAPI,
    prefix: &str,
    selector: F,
) -> Result<&'a T, Error>
where
    F: Fn(&'a Components) -> Option<&'a indexmap::IndexMap<String, ReferenceOr<T>>>,
{
    match ref_or {
        ReferenceOr::Item(item) => Ok(item),
        ReferenceOr::Reference { reference } => {
            let name = reference.strip_prefix(prefix).ok_or_else(|| Error::InvalidSpec {
                problems: vec![format!(
                    "invalid reference {}: expected prefix {}",
                    reference, prefix
                )],
            })?;

            spec.components
                .as_ref()
                .and_then(selector)
                .and_then(|map| map.get(name))
                .and_then(|r| r.as_item())
                .ok_or_else(|| Error::InvalidSpec {
                    problems: vec![format!("reference not found: {}", reference)],
                })
        }
    }
}

impl ResolveReference<openapiv3::Parameter> for ReferenceOr<openapiv3::Parameter> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Parameter, Error> {
        resolve_logic(self, spec, "#/components/parameters/", |c| {
            Some(&c.parameters)
        })
    }
}

impl ResolveReference<openapiv3::RequestBody> for ReferenceOr<openapiv3::RequestBody> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::RequestBody, Error> {
        resolve_logic(self, spec, "#/components/requestBodies/", |c| {
            Some(&c.request_bodies)
        })
    }
}

impl ResolveReference<openapiv3::Response> for ReferenceOr<openapiv3::Response> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Response, Error> {
        resolve_logic(self, spec, "#/components/responses/", |c| {
            Some(&c.responses)
        })
    }
}

impl ResolveReference<openapiv3::Schema> for ReferenceOr<openapiv3::Schema> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Schema, Error> {
        resolve_logic(self, spec, "#/components/schemas/", |c| Some(&c.schemas))
    }
}
