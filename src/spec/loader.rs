use crate::error::Error;
use crate::spec::reference_resolver::ResolveReference;
use openapiv3::{OpenAPI, ReferenceOr};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Loads an OpenAPI specification from a YAML or JSON file
pub fn load_openapi_spec(path: &Path) -> Result<OpenAPI, Error> {
    let load_error = |reason: String| Error::SpecLoad {
        path: path.to_path_buf(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&contents).map_err(|e| load_error(e.to_string()))
    } else {
        serde_yaml::from_str(&contents).map_err(|e| load_error(e.to_string()))
    }
}

/// Semantic checks a parsed document must pass before it is compiled.
///
/// Every problem found is reported in one [`Error::InvalidSpec`].
pub fn validate_document(spec: &OpenAPI) -> Result<(), Error> {
    let mut problems = Vec::new();

    if !spec.openapi.starts_with("3.0") {
        problems.push(format!(
            "unsupported openapi version {:?}, expected 3.0.x",
            spec.openapi
        ));
    }
    if spec.info.title.trim().is_empty() {
        problems.push("info.title must not be empty".to_string());
    }
    if spec.info.version.trim().is_empty() {
        problems.push("info.version must not be empty".to_string());
    }

    let mut operation_ids = HashSet::new();

    for (path, item) in &spec.paths.paths {
        if !path.starts_with('/') {
            problems.push(format!("path {} must start with '/'", path));
        }
        let Some(item) = item.as_item() else {
            continue;
        };

        let template_params = template_parameters(path);

        for (method, operation) in item.iter() {
            let label = format!("{} {}", method.to_uppercase(), path);

            if operation.responses.responses.is_empty() && operation.responses.default.is_none() {
                problems.push(format!("{}: at least one response is required", label));
            }

            if let Some(id) = &operation.operation_id {
                if !operation_ids.insert(id.clone()) {
                    problems.push(format!("{}: duplicate operationId {}", label, id));
                }
            }

            let declared = declared_path_parameters(
                spec,
                item.parameters.iter().chain(operation.parameters.iter()),
                &mut problems,
            );
            for name in &template_params {
                match declared.iter().find(|(declared, _)| declared == name) {
                    None => problems.push(format!(
                        "{}: path parameter {} is not declared",
                        label, name
                    )),
                    Some((_, false)) => problems.push(format!(
                        "{}: path parameter {} must be required",
                        label, name
                    )),
                    Some(_) => {}
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidSpec { problems })
    }
}

/// Names of the `{param}` segments of a path template.
pub fn template_parameters(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    names
}

fn declared_path_parameters<'a>(
    spec: &'a OpenAPI,
    parameters: impl Iterator<Item = &'a ReferenceOr<openapiv3::Parameter>>,
    problems: &mut Vec<String>,
) -> Vec<(String, bool)> {
    let mut declared = Vec::new();
    for parameter in parameters {
        match parameter.resolve(spec) {
            Ok(openapiv3::Parameter::Path { parameter_data, .. }) => {
                declared.push((parameter_data.name.clone(), parameter_data.required));
            }
            Ok(_) => {}
            Err(Error::InvalidSpec { problems: found }) => problems.extend(found),
            Err(other) => problems.push(other.to_string()),
        }
    }
    declared
}
