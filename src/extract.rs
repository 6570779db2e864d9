//! Request extractors that report failures as [CenterError]s.

use axum::body::HttpBody;
use axum::extract::{FromRequest, RequestParts};
use axum::{BoxError, Json};
use serde::de::DeserializeOwned;

use crate::error::CenterError;

/// A JSON request body.
///
/// Behaves like [axum::Json], but a body that is missing, mistyped or not
/// JSON at all is rejected with a JSON `400` instead of axum's plain-text
/// response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, B> FromRequest<B> for ApiJson<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = CenterError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req).await?;

        Ok(ApiJson(value))
    }
}
