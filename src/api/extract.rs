//! Request Extractors
//!
//! Thin wrappers over axum's `Json`, `Path` and `Query` whose rejections
//! become [`CheckoutError::InvalidInput`], so malformed requests get the
//! same JSON error body as every other failure.

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::CheckoutError;

// == Rejection Mapping ==
impl From<JsonRejection> for CheckoutError {
    fn from(rejection: JsonRejection) -> Self {
        CheckoutError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for CheckoutError {
    fn from(rejection: PathRejection) -> Self {
        CheckoutError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for CheckoutError {
    fn from(rejection: QueryRejection) -> Self {
        CheckoutError::InvalidInput(rejection.body_text())
    }
}

// == JSON Body ==
/// JSON request body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CheckoutError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// == Path Segments ==
/// Path parameters.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CheckoutError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

// == Query String ==
/// Query string parameters.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CheckoutError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
