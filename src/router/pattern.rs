use crate::error::Error;
use crate::operation::{HttpMethod, Operation};
use crate::router::{candidate_paths, decode_param, RouteMatch, RouteResolver};
use crate::spec::ApiSpec;
use http::{HeaderMap, Method};
use regex::Regex;
use std::sync::Arc;

struct PatternRoute {
    method: HttpMethod,
    regex: Regex,
    param_names: Vec<String>,
    operation: Arc<Operation>,
}

/// Linear resolver: one anchored regex per operation, first declared wins.
///
/// Accepts templates the radix tree refuses, such as `/files/{name}.{ext}`
/// next to `/files/{id}`.
pub struct RegexRouter {
    routes: Vec<PatternRoute>,
    base_paths: Vec<String>,
}

impl RegexRouter {
    pub fn from_spec(spec: &ApiSpec) -> Result<Self, Error> {
        Self::new(spec.operations(), spec.base_paths())
    }

    pub fn new(operations: &[Arc<Operation>], base_paths: Vec<String>) -> Result<Self, Error> {
        let routes = operations
            .iter()
            .map(|operation| {
                let (regex, param_names) = path_to_regex(&operation.template)?;
                Ok(PatternRoute {
                    method: operation.method,
                    regex,
                    param_names,
                    operation: operation.clone(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { routes, base_paths })
    }
}

/// Converts a path template such as `/users/{id}` into `^/users/([^/]+)$`.
fn path_to_regex(template: &str) -> Result<(Regex, Vec<String>), Error> {
    let mut pattern = String::with_capacity(template.len() + 8);
    pattern.push('^');
    let mut param_names = Vec::new();

    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let end = rest[start..]
            .find('}')
            .map(|len| start + len)
            .ok_or_else(|| Error::Router(format!("unclosed parameter in template {}", template)))?;
        pattern.push_str(&regex::escape(&rest[..start]));
        pattern.push_str("([^/]+?)");
        param_names.push(rest[start + 1..end].to_string());
        rest = &rest[end + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    let regex = Regex::new(&pattern)
        .map_err(|e| Error::Router(format!("invalid template {}: {}", template, e)))?;
    Ok((regex, param_names))
}

impl RouteResolver for RegexRouter {
    fn resolve(&self, method: &Method, path: &str, _headers: &HeaderMap) -> Option<RouteMatch> {
        let method = HttpMethod::from_http(method)?;

        for candidate in candidate_paths(&self.base_paths, path) {
            for route in self.routes.iter().filter(|r| r.method == method) {
                let Some(captures) = route.regex.captures(candidate) else {
                    continue;
                };
                let path_params = route
                    .param_names
                    .iter()
                    .zip(captures.iter().skip(1))
                    .filter_map(|(name, value)| {
                        value.map(|v| (name.clone(), decode_param(v.as_str())))
                    })
                    .collect();
                return Some(RouteMatch {
                    operation: route.operation.clone(),
                    path_params,
                });
            }
        }
        None
    }
}

impl std::fmt::Debug for RegexRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexRouter")
            .field("routes", &self.routes.len())
            .field("base_paths", &self.base_paths)
            .finish()
    }
}
