//! Route resolution: mapping a request onto a compiled operation.

mod pattern;
mod radix;

pub use pattern::RegexRouter;
pub use radix::MatchitRouter;

use crate::operation::Operation;
use http::{HeaderMap, Method};
use std::collections::HashMap;
use std::sync::Arc;

/// The operation a request was matched to, with its path parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: Arc<Operation>,
    /// Percent-decoded values keyed by template name.
    pub path_params: HashMap<String, String>,
}

/// Strategy for matching requests to operations.
///
/// `None` means the request is outside the documented surface.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, method: &Method, path: &str, headers: &HeaderMap) -> Option<RouteMatch>;
}

impl<R: RouteResolver + ?Sized> RouteResolver for Arc<R> {
    fn resolve(&self, method: &Method, path: &str, headers: &HeaderMap) -> Option<RouteMatch> {
        (**self).resolve(method, path, headers)
    }
}

/// Candidate paths to match once server base paths are stripped.
pub(crate) fn candidate_paths<'a>(base_paths: &'a [String], path: &'a str) -> Vec<&'a str> {
    if base_paths.is_empty() {
        return vec![path];
    }
    base_paths
        .iter()
        .filter_map(|base| path.strip_prefix(base.as_str()))
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .map(|rest| if rest.is_empty() { "/" } else { rest })
        .collect()
}

pub(crate) fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
