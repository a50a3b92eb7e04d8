//! HTTP middleware that validates requests and responses against an
//! OpenAPI 3 document, plus a Swagger UI service for the same document.

pub mod body;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod operation;
pub mod options;
pub mod report;
pub mod router;
pub mod spec;
pub mod validation_helpers;
pub mod validator;
pub mod validators;
pub mod violation;

pub use body::Body;
pub use docs::DocsService;
pub use error::{Error, ValidationError};
pub use middleware::{CapturedResponse, ValidationLayer, ValidationService};
pub use operation::{HttpMethod, Operation, OperationValidator};
pub use options::{LogObserver, Options, ResponseContext, ResponseObserver, Settings};
pub use report::{ErrorBody, ErrorEncoder, JsonErrorEncoder};
pub use router::{MatchitRouter, RegexRouter, RouteMatch, RouteResolver};
pub use spec::ApiSpec;
pub use validator::Validator;
pub use violation::ViolationKind;
