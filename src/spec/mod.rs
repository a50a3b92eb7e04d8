//! Loading, checking and compiling OpenAPI documents.

pub mod builder;
pub mod loader;
pub mod reference_resolver;

pub use builder::{build_registry, compile_operations};
pub use loader::{load_openapi_spec, template_parameters, validate_document};
pub use reference_resolver::ResolveReference;

use crate::error::Error;
use crate::operation::Operation;
use openapiv3::OpenAPI;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// A parsed, checked and compiled OpenAPI document.
#[derive(Debug)]
pub struct ApiSpec {
    document: OpenAPI,
    operations: Vec<Arc<Operation>>,
}

impl ApiSpec {
    /// Reads `path`, checks the document and compiles its operations.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let document = load_openapi_spec(path.as_ref())?;
        Self::from_document(document)
    }

    /// Checks and compiles an already parsed document.
    pub fn from_document(document: OpenAPI) -> Result<Self, Error> {
        validate_document(&document)?;
        let operations = compile_operations(&document)?;
        Ok(Self {
            document,
            operations,
        })
    }

    pub fn document(&self) -> &OpenAPI {
        &self.document
    }

    /// Compiled operations in declaration order.
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    /// URL path prefixes declared by `servers`; empty when templates are
    /// matched as written.
    pub fn base_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for server in &self.document.servers {
            let Some(path) = server_base_path(&server.url) else {
                continue;
            };
            if path.is_empty() {
                return Vec::new();
            }
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    /// The document as JSON, for the documentation endpoint.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.document)
    }
}

/// Path component of a server URL, without trailing slash.
///
/// Relative URLs resolve against the host root, so `v1` and `//host/v1`
/// both give `/v1`. Templated or unparsable URLs yield `None`.
fn server_base_path(server_url: &str) -> Option<String> {
    if server_url.contains('{') {
        return None;
    }
    let resolved = Url::parse("http://dummy/")
        .and_then(|root| root.join(server_url.trim()))
        .map_err(|e| warn!(url = %server_url, error = %e, "ignoring unparsable server URL"))
        .ok()?;
    Some(resolved.path().trim_end_matches('/').to_string())
}
