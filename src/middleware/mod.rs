//! Request pipeline stages, applied in `routes::with_pipeline`.

mod body;
mod errors;
mod logger;
mod validate;

pub use body::{parse_body, ParsedBody};
pub use errors::{normalize_errors, route_not_found};
pub use logger::log_request;
pub use validate::{validated, ValidatedParams, ValidatedQuery};
