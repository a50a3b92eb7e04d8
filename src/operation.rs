use crate::error::ValidationError;
use crate::validators::{ParametersValidator, RawParams, RequestBodyValidator, ResponseValidator};
use http::{header, HeaderMap, Method, StatusCode};
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::PATCH => "PATCH",
            Self::HEAD => "HEAD",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
        }
    }

    /// Converts an `http` method; extension methods have no OpenAPI slot.
    pub fn from_http(method: &Method) -> Option<Self> {
        method.as_str().parse().ok()
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::GET),
            "POST" => Ok(Self::POST),
            "PUT" => Ok(Self::PUT),
            "DELETE" => Ok(Self::DELETE),
            "PATCH" => Ok(Self::PATCH),
            "HEAD" => Ok(Self::HEAD),
            "OPTIONS" => Ok(Self::OPTIONS),
            "TRACE" => Ok(Self::TRACE),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validator for a single API operation (path + method combination)
#[derive(Debug)]
pub struct OperationValidator {
    pub request_body: Option<RequestBodyValidator>,
    pub responses: ResponseValidator,
    pub parameters: ParametersValidator,
}

impl OperationValidator {
    pub fn new(
        request_body: Option<RequestBodyValidator>,
        responses: ResponseValidator,
        parameters: ParametersValidator,
    ) -> Self {
        Self {
            request_body,
            responses,
            parameters,
        }
    }

    /// Checks path parameters, query, headers and body, stopping at the
    /// first failing group.
    pub fn validate_request(
        &self,
        path_params: &HashMap<String, String>,
        query: Option<&str>,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), ValidationError> {
        let path: RawParams = path_params
            .iter()
            .map(|(name, value)| (name.clone(), vec![value.clone()]))
            .collect();
        self.parameters.validate_path(&path)?;

        self.parameters.validate_query(&parse_query(query)?)?;
        self.parameters.validate_headers(&header_params(headers))?;

        if let Some(request_body) = &self.request_body {
            request_body.validate(content_type(headers), body)?;
        }
        Ok(())
    }

    /// Checks a finished response against the declared responses.
    pub fn validate_response(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(), ValidationError> {
        self.responses
            .validate(status.as_u16(), content_type(headers), body)
    }
}

/// A compiled (method, path template) entry of the document.
#[derive(Debug)]
pub struct Operation {
    pub method: HttpMethod,
    pub template: String,
    pub operation_id: Option<String>,
    pub validator: OperationValidator,
}

impl Operation {
    /// Human-readable `METHOD /template` label.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.template)
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

fn parse_query(query: Option<&str>) -> Result<RawParams, ValidationError> {
    let mut params = RawParams::new();
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Ok(params);
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| ValidationError::MalformedQuery(e.to_string()))?;
    for (name, value) in pairs {
        params.entry(name).or_default().push(value);
    }
    Ok(params)
}

fn header_params(headers: &HeaderMap) -> RawParams {
    let mut params = RawParams::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            params
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());
        }
    }
    params
}
