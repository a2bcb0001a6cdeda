//! Why a request was turned away by the auth or role gate.
//!
//! Every variant is an expected, per-request outcome. Credential store failures are
//! not represented here; they travel as `GateError::Store*` so they can never be
//! mistaken for "access denied".

use axum::http::StatusCode;
use thiserror::Error;

use crate::services::auth::TokenError;

/// Stages of the combined auth + role pipeline.
///
/// `Start -> HeaderChecked -> TokenVerified -> IdentityResolved -> RoleChecked -> Allowed`
/// A rejection reports the last stage reached; there is no way back. Routes without a
/// role gate hand over to the handler at `IdentityResolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Start,
    HeaderChecked,
    TokenVerified,
    IdentityResolved,
    RoleChecked,
    Allowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("authentication token is required")]
    MissingToken,
    #[error("invalid authentication token")]
    InvalidToken,
    #[error("authentication token has expired")]
    ExpiredToken,
    #[error("no user matches this token")]
    UnknownSubject,
    #[error("authentication is required")]
    Unauthenticated,
    #[error("you do not have permission to perform this action")]
    Forbidden,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::UnknownSubject => "UNKNOWN_SUBJECT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// The last stage the request reached before this rejection.
    pub fn stage(&self) -> GateStage {
        match self {
            Self::MissingToken => GateStage::Start,
            Self::InvalidToken | Self::ExpiredToken => GateStage::HeaderChecked,
            Self::UnknownSubject => GateStage::TokenVerified,
            Self::Unauthenticated | Self::Forbidden => GateStage::IdentityResolved,
        }
    }
}

impl From<TokenError> for AuthRejection {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Expired => Self::ExpiredToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_forbidden_maps_to_403() {
        let all = [
            AuthRejection::MissingToken,
            AuthRejection::InvalidToken,
            AuthRejection::ExpiredToken,
            AuthRejection::UnknownSubject,
            AuthRejection::Unauthenticated,
        ];
        for r in all {
            assert_eq!(r.status(), StatusCode::UNAUTHORIZED, "{r:?}");
        }
        assert_eq!(AuthRejection::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn token_errors_keep_their_kind() {
        assert_eq!(
            AuthRejection::from(TokenError::Invalid),
            AuthRejection::InvalidToken
        );
        assert_eq!(
            AuthRejection::from(TokenError::Expired),
            AuthRejection::ExpiredToken
        );
    }

    #[test]
    fn rejections_report_the_last_stage_reached() {
        let expected = [
            (AuthRejection::MissingToken, GateStage::Start),
            (AuthRejection::InvalidToken, GateStage::HeaderChecked),
            (AuthRejection::ExpiredToken, GateStage::HeaderChecked),
            (AuthRejection::UnknownSubject, GateStage::TokenVerified),
            (AuthRejection::Unauthenticated, GateStage::IdentityResolved),
            (AuthRejection::Forbidden, GateStage::IdentityResolved),
        ];
        for (rejection, stage) in expected {
            assert_eq!(rejection.stage(), stage, "{rejection:?}");
        }
    }
}
