//! Request parameter extraction
//!
//! Every command takes one ordered list of key/value pairs. The URL query
//! is read first, then the body, which may be a JSON object or a
//! url-encoded form.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde_json::{Map, Value};

use crate::error::CacheError;
use crate::models::KeyPairs;

#[async_trait]
impl<S> FromRequest<S> for KeyPairs
where
    S: Send + Sync,
{
    type Rejection = CacheError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|rejection| CacheError::Validation(rejection.body_text()))?;
        let mut pairs: KeyPairs = query.into_iter().collect();

        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let body = if is_form {
            let Form(form) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| CacheError::Validation(rejection.body_text()))?;
            form.into_iter().collect()
        } else {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| CacheError::Validation(rejection.body_text()))?;
            parse_json_body(&bytes)?
        };

        pairs.merge(body);
        Ok(pairs)
    }
}

/// Parses a JSON object body. An empty body carries no parameters.
fn parse_json_body(bytes: &[u8]) -> Result<KeyPairs, CacheError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(KeyPairs::new());
    }

    let object: Map<String, Value> = serde_json::from_slice(bytes).map_err(|e| {
        CacheError::Validation(format!("Request body must be a JSON object: {}", e))
    })?;
    Ok(KeyPairs::from_json_object(object))
}
