//! Request validation: schemas and the body → query → params validator.

pub mod schema;
mod validation;
pub use schema::{number, object, text, FieldSchema, NumberSchema, ObjectSchema, Schema, TextSchema};
pub use validation::{validate, RequestData, SchemaSet};
