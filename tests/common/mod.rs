//! Shared fixtures for the integration tests: credential stores that need no database,
//! a gate wired to them, and request helpers.
#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
    routing::get,
};
use blog_api::{
    api::v1::extractors::CurrentIdentity,
    middleware::auth::{AuthGate, access, role},
    repos::error::RepoError,
    services::auth::{CredentialRecord, CredentialStore, Role, StoredCredential, TokenCodec},
};
use serde_json::{Value, json};
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const TTL_SECONDS: u64 = 3600;
pub const LOOKUP_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<Uuid, CredentialRecord>,
}

impl InMemoryStore {
    pub fn with_user(mut self, role: Role, is_active: bool) -> (Self, Uuid) {
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            CredentialRecord {
                id,
                email: format!("{id}@example.com"),
                role,
                is_active,
            },
        );
        (self, id)
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>, RepoError> {
        Ok(self.users.get(&id).cloned())
    }

    async fn find_by_email_with_secret(
        &self,
        _email: &str,
    ) -> Result<Option<StoredCredential>, RepoError> {
        Ok(None)
    }
}

/// Every lookup fails as if the database were down.
pub struct FailingStore;

#[async_trait]
impl CredentialStore for FailingStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<CredentialRecord>, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_email_with_secret(
        &self,
        _email: &str,
    ) -> Result<Option<StoredCredential>, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }
}

/// Never answers within `LOOKUP_TIMEOUT`.
pub struct SlowStore;

#[async_trait]
impl CredentialStore for SlowStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<CredentialRecord>, RepoError> {
        tokio::time::sleep(LOOKUP_TIMEOUT * 20).await;
        Ok(None)
    }

    async fn find_by_email_with_secret(
        &self,
        _email: &str,
    ) -> Result<Option<StoredCredential>, RepoError> {
        tokio::time::sleep(LOOKUP_TIMEOUT * 20).await;
        Ok(None)
    }
}

pub fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(SECRET, TTL_SECONDS))
}

pub fn gate(store: impl CredentialStore) -> AuthGate {
    AuthGate::new(codec(), Arc::new(store), LOOKUP_TIMEOUT)
}

pub fn token_for(subject: Uuid) -> String {
    codec().issue(subject).unwrap().token
}

async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> Json<Value> {
    Json(json!({
        "subject_id": identity.subject_id,
        "role": identity.role,
    }))
}

/// `/open` is public, `/me` needs a token, `/admin` needs an admin token.
pub fn gated_router(gate: AuthGate) -> Router {
    let admin = role::apply(Router::new().route("/admin", get(whoami)), &[Role::Admin]);
    let protected = access::apply(Router::new().route("/me", get(whoami)).merge(admin), gate);

    Router::new()
        .route("/open", get(|| async { "ok" }))
        .merge(protected)
}

pub fn get_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn read_json(res: Response<Body>) -> (StatusCode, Value) {
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
