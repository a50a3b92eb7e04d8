use crate::error::Error;
use crate::operation::{HttpMethod, Operation, OperationValidator};
use crate::spec::reference_resolver::ResolveReference;
use crate::validation_helpers::SPEC_BASE_URI;
use crate::validators::{
    ParamKind, ParameterLocation, ParameterValidator, ParametersValidator, RequestBodyValidator,
    ResponseValidator,
};
use jsonschema::{Draft, Registry};
use openapiv3::{OpenAPI, ReferenceOr, Schema, SchemaKind, Type};
use serde_json::{self, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Nesting limit when following schema references to find a parameter type.
const MAX_REF_DEPTH: usize = 16;

/// Converts a schema reference to JSON Value
fn schema_to_json(schema_ref: &impl serde::Serialize, context: &str) -> Result<Value, Error> {
    serde_json::to_value(schema_ref).map_err(|e| {
        Error::SchemaCompilation(format!(
            "failed to convert {} schema to JSON: {}",
            context, e
        ))
    })
}

/// Builds JSON Schema registry from OpenAPI components section
pub fn build_registry(spec: &OpenAPI) -> Result<Registry, Error> {
    let components_json = match &spec.components {
        Some(components) => schema_to_json(components, "components")?,
        None => Value::Object(Default::default()),
    };

    let wrapped_components = serde_json::json!({
        "components": crate::validation_helpers::normalize_schema(components_json)
    });

    let components_resource = Draft::Draft4.create_resource(wrapped_components);

    Registry::try_new(SPEC_BASE_URI, components_resource)
        .map_err(|e| Error::SchemaCompilation(format!("failed to create registry: {}", e)))
}

/// Compiles every operation of the document, in declaration order.
pub fn compile_operations(spec: &OpenAPI) -> Result<Vec<Arc<Operation>>, Error> {
    let registry = build_registry(spec)?;
    let mut operations = Vec::new();

    for (path, path_item_ref) in &spec.paths.paths {
        let path_item = match path_item_ref {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                warn!(path = %path, reference = %reference, "skipping path item reference; not supported");
                continue;
            }
        };

        for (method_str, operation) in path_item.iter() {
            let method = HttpMethod::from_str(method_str).map_err(|_| Error::InvalidSpec {
                problems: vec![format!("unknown HTTP method: {}", method_str)],
            })?;

            let validator = build_operation_validator(
                spec,
                &registry,
                &path_item.parameters,
                operation,
            )?;
            operations.push(Arc::new(Operation {
                method,
                template: path.clone(),
                operation_id: operation.operation_id.clone(),
                validator,
            }));
        }
    }

    debug!(operations = operations.len(), "compiled OpenAPI operations");
    Ok(operations)
}

/// Build an OperationValidator from an OpenAPI operation
fn build_operation_validator(
    spec: &OpenAPI,
    registry: &Registry,
    shared_parameters: &[ReferenceOr<openapiv3::Parameter>],
    operation: &openapiv3::Operation,
) -> Result<OperationValidator, Error> {
    let parameters_validator =
        build_parameters_validator(spec, registry, shared_parameters, &operation.parameters)?;

    let request_body_validator = match &operation.request_body {
        Some(request_body) => {
            let request_body = request_body.resolve(spec)?;
            Some(RequestBodyValidator::new(
                &request_body.content,
                request_body.required,
                registry,
            )?)
        }
        None => None,
    };

    let response_validator = build_response_validator(spec, registry, &operation.responses)?;

    Ok(OperationValidator::new(
        request_body_validator,
        response_validator,
        parameters_validator,
    ))
}

/// Build a ResponseValidator from OpenAPI Responses
fn build_response_validator(
    spec: &OpenAPI,
    registry: &Registry,
    responses: &openapiv3::Responses,
) -> Result<ResponseValidator, Error> {
    let mut response_validator = ResponseValidator::new();

    for (status_code, response_ref) in &responses.responses {
        let response = response_ref.resolve(spec)?;
        match status_code {
            openapiv3::StatusCode::Code(code) => {
                response_validator.add_response(*code, &response.content, registry)?
            }
            openapiv3::StatusCode::Range(class) => {
                response_validator.add_range(*class, &response.content, registry)?
            }
        }
    }

    if let Some(default_response_ref) = &responses.default {
        let default_response = default_response_ref.resolve(spec)?;
        response_validator.set_default(&default_response.content, registry)?;
    }

    Ok(response_validator)
}

/// Build a ParametersValidator from path-item and operation parameters.
///
/// An operation parameter replaces a path-item parameter with the same
/// name and location.
fn build_parameters_validator(
    spec: &OpenAPI,
    registry: &Registry,
    shared: &[ReferenceOr<openapiv3::Parameter>],
    own: &[ReferenceOr<openapiv3::Parameter>],
) -> Result<ParametersValidator, Error> {
    let mut merged: Vec<(ParameterLocation, &openapiv3::ParameterData)> = Vec::new();

    for parameter_ref in shared.iter().chain(own) {
        let parameter = parameter_ref.resolve(spec)?;

        let (location, parameter_data) = match parameter {
            openapiv3::Parameter::Query { parameter_data, .. } => {
                (ParameterLocation::Query, parameter_data)
            }
            openapiv3::Parameter::Path { parameter_data, .. } => {
                (ParameterLocation::Path, parameter_data)
            }
            openapiv3::Parameter::Header { parameter_data, .. } => {
                (ParameterLocation::Header, parameter_data)
            }
            openapiv3::Parameter::Cookie { .. } => continue,
        };

        merged.retain(|(loc, data)| !(*loc == location && data.name == parameter_data.name));
        merged.push((location, parameter_data));
    }

    let mut params_validator = ParametersValidator::new();
    for (location, parameter_data) in merged {
        let schema_ref = match &parameter_data.format {
            openapiv3::ParameterSchemaOrContent::Schema(s) => s,
            openapiv3::ParameterSchemaOrContent::Content(_) => {
                debug!(parameter = %parameter_data.name, "skipping content-based parameter");
                continue;
            }
        };

        let schema_json = schema_to_json(schema_ref, "parameter")?;
        let kind = param_kind_of(spec, schema_ref, 0);

        let param_validator = ParameterValidator::new(
            parameter_data.name.clone(),
            parameter_data.required,
            kind,
            &schema_json,
            registry,
        )?;
        params_validator.add(location, param_validator);
    }

    Ok(params_validator)
}

fn param_kind_of(spec: &OpenAPI, schema_ref: &ReferenceOr<Schema>, depth: usize) -> ParamKind {
    if depth > MAX_REF_DEPTH {
        return ParamKind::Any;
    }
    match schema_ref.resolve(spec) {
        Ok(schema) => param_kind_of_schema(spec, schema, depth),
        Err(_) => ParamKind::Any,
    }
}

fn param_kind_of_schema(spec: &OpenAPI, schema: &Schema, depth: usize) -> ParamKind {
    match &schema.schema_kind {
        SchemaKind::Type(Type::String(_)) => ParamKind::String,
        SchemaKind::Type(Type::Integer(_)) => ParamKind::Integer,
        SchemaKind::Type(Type::Number(_)) => ParamKind::Number,
        SchemaKind::Type(Type::Boolean(_)) => ParamKind::Boolean,
        SchemaKind::Type(Type::Array(array)) => {
            let item = match &array.items {
                Some(ReferenceOr::Item(item)) => param_kind_of_schema(spec, item, depth + 1),
                Some(ReferenceOr::Reference { reference }) => param_kind_of(
                    spec,
                    &ReferenceOr::Reference {
                        reference: reference.clone(),
                    },
                    depth + 1,
                ),
                None => ParamKind::Any,
            };
            ParamKind::Array(Box::new(item))
        }
        _ => ParamKind::Any,
    }
}
