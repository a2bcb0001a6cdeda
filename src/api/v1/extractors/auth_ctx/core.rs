use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::middleware::auth::AuthRejection;

use super::Identity;

/// Extractor that hands the authenticated `Identity` to a handler.
/// Assumes the auth gate already inserted it into request extensions;
/// without it (route not behind the gate) the request is rejected with 401.
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(CurrentIdentity)
            .ok_or(AppError::Auth(AuthRejection::Unauthenticated))
    }
}
