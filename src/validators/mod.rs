pub mod body;
pub mod parameter;
pub mod request;
pub mod response;

pub use body::{is_json, BodyValidator};
pub use parameter::{
    ParamKind, ParameterLocation, ParameterValidator, ParametersValidator, RawParams,
};
pub use request::RequestBodyValidator;
pub use response::ResponseValidator;
