//! Request extractors that reject with the JSON error body.
//!
//! Axum's stock `Path`, `Query` and `Json` extractors answer malformed input
//! with plain-text 400/422 responses. These wrappers delegate to them and turn
//! every rejection into an [`AppError::BadRequest`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use bookshelf_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;

/// Parse a raw id segment. Only integers are accepted.
fn parse_id(raw: &str) -> Result<DbId, AppError> {
    raw.trim()
        .parse::<DbId>()
        .map_err(|_| AppError::BadRequest(format!("Invalid id '{raw}': expected an integer")))
}

/// An entity id taken from the `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub DbId);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        parse_id(&raw).map(IdPath)
    }
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: Option<String>,
}

/// An entity id taken from the `?id=` query parameter.
///
/// Used by the compatibility routes that address a resource on its
/// collection path.
#[derive(Debug, Clone, Copy)]
pub struct IdQuery(pub DbId);

impl<S> FromRequestParts<S> for IdQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<IdParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        match params.id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_id(raw).map(IdQuery),
            _ => Err(AppError::BadRequest("id query parameter is required".into())),
        }
    }
}

/// Typed query string.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

/// JSON request body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        Ok(JsonBody(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
        JsonRejection::MissingJsonContentType(_) => {
            "Expected a body with Content-Type: application/json".to_string()
        }
        _ => rejection.body_text(),
    };
    AppError::BadRequest(message)
}
