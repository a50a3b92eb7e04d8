use crate::error::Error;
use crate::operation::{HttpMethod, Operation};
use crate::router::{candidate_paths, decode_param, RouteMatch, RouteResolver};
use crate::spec::ApiSpec;
use http::{HeaderMap, Method};
use matchit::Router;
use std::collections::HashMap;
use std::sync::Arc;

/// Map of HTTP methods to their operations
type OperationMap = HashMap<HttpMethod, Arc<Operation>>;

/// Default resolver: a radix tree over the path templates.
pub struct MatchitRouter {
    router: Router<OperationMap>,
    base_paths: Vec<String>,
}

impl MatchitRouter {
    pub fn from_spec(spec: &ApiSpec) -> Result<Self, Error> {
        Self::new(spec.operations(), spec.base_paths())
    }

    pub fn new(operations: &[Arc<Operation>], base_paths: Vec<String>) -> Result<Self, Error> {
        let mut by_template: Vec<(&str, OperationMap)> = Vec::new();
        for operation in operations {
            let template = operation.template.as_str();
            match by_template.iter_mut().find(|(t, _)| *t == template) {
                Some((_, methods)) => {
                    methods.insert(operation.method, operation.clone());
                }
                None => {
                    let mut methods = OperationMap::new();
                    methods.insert(operation.method, operation.clone());
                    by_template.push((template, methods));
                }
            }
        }

        let mut router = Router::new();
        for (template, methods) in by_template {
            router
                .insert(template, methods)
                .map_err(|e| Error::Router(format!("failed to add route '{}': {}", template, e)))?;
        }

        Ok(Self { router, base_paths })
    }
}

impl RouteResolver for MatchitRouter {
    fn resolve(&self, method: &Method, path: &str, _headers: &HeaderMap) -> Option<RouteMatch> {
        let method = HttpMethod::from_http(method)?;

        candidate_paths(&self.base_paths, path)
            .into_iter()
            .find_map(|candidate| {
                let matched = self.router.at(candidate).ok()?;
                let operation = matched.value.get(&method)?;
                let path_params = matched
                    .params
                    .iter()
                    .map(|(name, value)| (name.to_string(), decode_param(value)))
                    .collect();
                Some(RouteMatch {
                    operation: operation.clone(),
                    path_params,
                })
            })
    }
}

impl std::fmt::Debug for MatchitRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchitRouter")
            .field("base_paths", &self.base_paths)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> ApiSpec {
        ApiSpec::from_document(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    const PETS: &str = r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /pets:
    get: {responses: {'200': {description: OK}}}
    post: {responses: {'201': {description: created}}}
  /pets/{id}:
    get:
      parameters: [{name: id, in: path, required: true, schema: {type: string}}]
      responses: {'200': {description: OK}}
  /pets/mine:
    get: {responses: {'200': {description: OK}}}
"#;

    #[test]
    fn resolves_method_and_template() {
        let router = MatchitRouter::from_spec(&spec(PETS)).unwrap();
        let headers = HeaderMap::new();

        let matched = router.resolve(&Method::POST, "/pets", &headers).unwrap();
        assert_eq!(matched.operation.label(), "POST /pets");

        let matched = router.resolve(&Method::GET, "/pets/rex%20jr", &headers).unwrap();
        assert_eq!(matched.operation.label(), "GET /pets/{id}");
        assert_eq!(matched.path_params["id"], "rex jr");
    }

    #[test]
    fn static_segments_win_over_parameters() {
        let router = MatchitRouter::from_spec(&spec(PETS)).unwrap();
        let matched = router.resolve(&Method::GET, "/pets/mine", &HeaderMap::new()).unwrap();
        assert_eq!(matched.operation.template, "/pets/mine");
    }

    #[test]
    fn unknown_path_or_method_is_not_found() {
        let router = MatchitRouter::from_spec(&spec(PETS)).unwrap();
        let headers = HeaderMap::new();
        assert!(router.resolve(&Method::GET, "/owners", &headers).is_none());
        assert!(router.resolve(&Method::DELETE, "/pets", &headers).is_none());
    }

    #[test]
    fn honours_server_base_path() {
        let router = MatchitRouter::from_spec(&spec(
            r#"
openapi: 3.0.0
info: {title: t, version: "1"}
servers: [{url: "https://example.com/v1"}]
paths:
  /pets:
    get: {responses: {'200': {description: OK}}}
"#,
        ))
        .unwrap();
        let headers = HeaderMap::new();
        assert!(router.resolve(&Method::GET, "/v1/pets", &headers).is_some());
        assert!(router.resolve(&Method::GET, "/pets", &headers).is_none());
    }
}
