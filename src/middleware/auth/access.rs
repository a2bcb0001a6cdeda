//! Bearer token verification -> resolve the subject -> put `Identity` into extensions.
//!
//! Contract:
//! - `Authorization: Bearer <token>` must be present; anything else is `MissingToken`
//!   (wrong scheme and empty token included, so callers cannot tell whether a token was tried).
//! - The token is checked by `TokenCodec`; failures surface as `InvalidToken` / `ExpiredToken`.
//! - The subject is looked up in the credential store, bounded by `lookup_timeout`.
//!   Absent or deactivated users are `UnknownSubject`.
//! - Store errors and timeouts are NOT rejections; they propagate as `GateError::Store*`.
//!
//! The gate keeps no state between requests.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::Identity;
use crate::error::AppError;
use crate::middleware::auth::rejection::{AuthRejection, GateStage};
use crate::repos::error::RepoError;
use crate::services::auth::{CredentialStore, TokenCodec};

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Rejected(#[from] AuthRejection),
    #[error("credential store unavailable")]
    StoreUnavailable(#[source] RepoError),
    #[error("credential store lookup timed out")]
    StoreTimeout,
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("tokens", &self.tokens)
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            credentials,
            lookup_timeout,
        }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Run the header -> token -> subject pipeline for one request.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, GateError> {
        // Start -> HeaderChecked
        let token = bearer_token(headers)?;

        // HeaderChecked -> TokenVerified
        let subject_id = self.tokens.verify(token).map_err(AuthRejection::from)?;

        // TokenVerified -> IdentityResolved
        let lookup = self.credentials.find_by_id(subject_id);
        let record = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(record)) => record,
            Ok(Err(err)) => return Err(GateError::StoreUnavailable(err)),
            Err(_) => return Err(GateError::StoreTimeout),
        };

        match record {
            Some(record) if record.is_active => Ok(Identity::new(record.id, record.role)),
            _ => Err(AuthRejection::UnknownSubject.into()),
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthRejection::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthRejection::MissingToken)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthRejection::MissingToken);
    }

    Ok(token)
}

/// Require a valid bearer token on every route currently registered on `router`.
///
/// ```ignore
/// let protected = Router::new().route("/auth/me", get(me));
/// let protected = middleware::auth::access::apply(protected, state.gate.clone());
/// ```
pub fn apply<S>(router: Router<S>, gate: AuthGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // route_layer: unmatched paths still fall through to 404 instead of 401
    router.route_layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<AuthGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match gate.authenticate(req.headers()).await {
        Ok(identity) => identity,
        Err(GateError::Rejected(rejection)) => {
            tracing::warn!(
                stage = ?rejection.stage(),
                code = rejection.code(),
                method = %req.method(),
                path = %req.uri().path(),
                "request rejected by auth gate"
            );
            return Err(AppError::Auth(rejection));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::debug!(
        stage = ?GateStage::IdentityResolved,
        user_id = %identity.subject_id,
        role = %identity.role,
        "request authenticated"
    );

    // middleware -> extractor handoff
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn accepts_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_missing_token() {
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(AuthRejection::MissingToken)
        );
    }

    #[test]
    fn malformed_headers_are_missing_token() {
        for value in ["Token abc", "bearer abc", "Bearer", "Bearer ", "Bearer    ", "Basic dXNlcjpwdw==", "Bearer a b"] {
            assert_eq!(
                bearer_token(&headers(value)),
                Err(AuthRejection::MissingToken),
                "{value:?}"
            );
        }
    }

    #[test]
    fn non_ascii_header_is_missing_token() {
        let mut h = HeaderMap::new();
        h.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert_eq!(bearer_token(&h), Err(AuthRejection::MissingToken));
    }
}
