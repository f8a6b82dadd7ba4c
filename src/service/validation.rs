//! Request validation: run the declared schemas over body, query and params.

use crate::error::ApplicationError;
use crate::service::schema::Schema;
use serde_json::{Map, Value};

/// Schemas a route declares for each request part.
#[derive(Default)]
pub struct SchemaSet {
    body: Option<Box<dyn Schema>>,
    query: Option<Box<dyn Schema>>,
    params: Option<Box<dyn Schema>>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, schema: impl Schema + 'static) -> Self {
        self.body = Some(Box::new(schema));
        self
    }

    pub fn query(mut self, schema: impl Schema + 'static) -> Self {
        self.query = Some(Box::new(schema));
        self
    }

    pub fn params(mut self, schema: impl Schema + 'static) -> Self {
        self.params = Some(Box::new(schema));
        self
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }
}

/// The three validatable slots of a request.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestData {
    pub body: Value,
    pub query: Value,
    pub params: Value,
}

impl Default for RequestData {
    fn default() -> Self {
        RequestData {
            body: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
        }
    }
}

/// Validate body, then query, then params. The first failing part ends validation;
/// parts that pass are replaced with their sanitized value.
pub fn validate(schemas: &SchemaSet, mut request: RequestData) -> Result<RequestData, ApplicationError> {
    let parts = [
        (&schemas.body, &mut request.body),
        (&schemas.query, &mut request.query),
        (&schemas.params, &mut request.params),
    ];
    for (schema, slot) in parts {
        let Some(schema) = schema else {
            continue;
        };
        match schema.parse(slot) {
            Ok(clean) => *slot = clean,
            Err(errors) => return Err(ApplicationError::validation(errors)),
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::service::schema::{number, object, text};
    use axum::http::StatusCode;
    use serde_json::json;

    fn request(body: Value, query: Value, params: Value) -> RequestData {
        RequestData { body, query, params }
    }

    #[test]
    fn empty_set_passes_everything_through() {
        let raw = request(json!({"a": 1}), json!({"q": "x"}), json!({"id": "1"}));
        assert_eq!(validate(&SchemaSet::new(), raw.clone()).unwrap(), raw);
    }

    #[test]
    fn sanitized_values_replace_raw_slots() {
        let schemas = SchemaSet::new()
            .body(object().field("name", text()))
            .query(object().field("page", number().coerce().default(1.0)))
            .params(object().field("id", text().min(1)));
        let out = validate(
            &schemas,
            request(json!({"name": "a", "junk": true}), json!({}), json!({"id": "7"})),
        )
        .unwrap();
        assert_eq!(out.body, json!({"name": "a"}));
        assert_eq!(out.query, json!({"page": 1}));
        assert_eq!(out.params, json!({"id": "7"}));
    }

    #[test]
    fn failure_is_operational_400_with_field_errors() {
        let schemas = SchemaSet::new().body(object().field("email", text().email()));
        let err = validate(&schemas, request(json!({"email": "bad"}), json!({}), json!({}))).unwrap_err();
        assert_eq!(err.message(), "Validation error");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_operational());
        assert_eq!(err.errors(), Some(&[FieldError::new("email", "Invalid email")][..]));
    }

    #[test]
    fn body_fails_before_params_are_checked() {
        let schemas = SchemaSet::new()
            .params(object().field("id", text().min(1)))
            .body(object().field("name", text()));
        let err = validate(&schemas, request(json!({}), json!({}), json!({"id": ""}))).unwrap_err();
        let fields: Vec<_> = err.errors().unwrap_or_default().iter().map(|e| e.field.clone()).collect();
        assert_eq!(fields, vec!["name"]);
    }

    #[test]
    fn query_fails_before_params() {
        let schemas = SchemaSet::new()
            .query(object().field("page", number().coerce()))
            .params(object().field("id", text().min(1)));
        let err = validate(&schemas, request(json!({}), json!({"page": "x"}), json!({"id": ""}))).unwrap_err();
        assert_eq!(err.errors().map(|e| e[0].field.as_str()), Some("page"));
    }

    #[test]
    fn params_checked_when_earlier_parts_pass() {
        let schemas = SchemaSet::new().params(object().field("id", text().min(1).message("ID is required")));
        let err = validate(&schemas, request(json!({}), json!({}), json!({"id": ""}))).unwrap_err();
        assert_eq!(err.errors(), Some(&[FieldError::new("id", "ID is required")][..]));
    }
}
