//! Body extractors that reject with `AppError`
//!
//! axum's own `Json` and `Bytes` answer plain-text 422/413 on failure; these
//! wrappers route the same failures through the JSON error body.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::AppError;

/// JSON request body
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Raw CSV request body, capped by the router's body limit
pub struct CsvBody(pub Bytes);

#[axum::async_trait]
impl<S> FromRequest<S> for CsvBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await?;
        Ok(Self(body))
    }
}
