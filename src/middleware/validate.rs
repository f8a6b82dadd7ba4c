//! Route-scoped validator stage. Sanitized parts replace the raw ones in extensions.

use crate::error::{AppError, ApplicationError};
use crate::middleware::ParsedBody;
use crate::service::{validate, RequestData, SchemaSet};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, Request, State,
    },
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ValidatedQuery(pub Value);

#[derive(Clone, Debug)]
pub struct ValidatedParams(pub Value);

fn to_object(map: HashMap<String, String>) -> Value {
    Value::Object(map.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        ApplicationError::new(rejection.body_text(), rejection.status()).into()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        ApplicationError::new(rejection.body_text(), rejection.status()).into()
    }
}

async fn validate_request(
    State(schemas): State<Arc<SchemaSet>>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Path(params) = params?;
    let Query(query) = query?;
    let body = request
        .extensions()
        .get::<ParsedBody>()
        .map(|b| b.0.clone())
        .unwrap_or_else(|| Value::Object(Map::new()));
    let raw = RequestData {
        body,
        query: to_object(query),
        params: to_object(params),
    };
    let clean = validate(&schemas, raw)?;
    let extensions = request.extensions_mut();
    extensions.insert(ParsedBody(clean.body));
    if schemas.has_query() {
        extensions.insert(ValidatedQuery(clean.query));
    }
    if schemas.has_params() {
        extensions.insert(ValidatedParams(clean.params));
    }
    Ok(next.run(request).await)
}

/// Run `schemas` before the handler of `method_router`. Only matched methods are
/// validated, so an unsupported method still falls through to the not-found stage.
pub fn validated<S>(method_router: MethodRouter<S>, schemas: SchemaSet) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    method_router.route_layer(middleware::from_fn_with_state(Arc::new(schemas), validate_request))
}
