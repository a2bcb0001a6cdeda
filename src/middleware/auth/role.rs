//! Role allow-list, composed after the auth gate.
//!
//! The allow-list is fixed when the route is registered. The decision itself is a
//! pure function of the request's `Identity`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Identity;
use crate::error::AppError;
use crate::middleware::auth::rejection::{AuthRejection, GateStage};
use crate::services::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Reject(AuthRejection),
}

impl GateDecision {
    /// Where the pipeline ended for this request.
    pub fn stage(&self) -> GateStage {
        match self {
            GateDecision::Allow => GateStage::Allowed,
            GateDecision::Reject(rejection) => rejection.stage(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: Arc::from(allowed),
        }
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    pub fn decide(&self, identity: Option<&Identity>) -> GateDecision {
        match identity {
            // Only reachable when the role gate is mounted without the auth gate in front.
            None => GateDecision::Reject(AuthRejection::Unauthenticated),
            Some(identity) if self.allowed.contains(&identity.role) => GateDecision::Allow,
            Some(_) => GateDecision::Reject(AuthRejection::Forbidden),
        }
    }
}

/// Restrict every route currently registered on `router` to the given roles.
pub fn apply<S>(router: Router<S>, allowed: &[Role]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        RoleGate::new(allowed),
        role_middleware,
    ))
}

async fn role_middleware(
    State(gate): State<RoleGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().cloned();

    let decision = gate.decide(identity.as_ref());
    match decision {
        GateDecision::Allow => {
            tracing::debug!(
                from = ?GateStage::RoleChecked,
                to = ?decision.stage(),
                "role check passed"
            );
            Ok(next.run(req).await)
        }
        GateDecision::Reject(rejection) => {
            tracing::warn!(
                stage = ?decision.stage(),
                code = rejection.code(),
                user_id = ?identity.as_ref().map(|i| i.subject_id),
                role = ?identity.as_ref().map(|i| i.role),
                allowed = ?gate.allowed(),
                path = %req.uri().path(),
                "request rejected by role gate"
            );
            Err(AppError::Auth(rejection))
        }
    }
}
