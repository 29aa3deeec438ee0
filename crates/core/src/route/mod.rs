//! Route model builder: one [`Route`] per (path, method).

mod builder;
mod model;
mod naming;

pub use builder::build_model;
pub use model::{
    BodyContent, BodyKind, Failure, FailureSubject, HttpMethod, OperationKind, ParamLocation,
    Parameter, RequestBody, ResponseVariant, Route, RouteModel, StatusCode, colon_template,
    placeholders, route_key,
};
pub use naming::{pascal_case, route_name};
