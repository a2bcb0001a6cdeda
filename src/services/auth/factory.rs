//! Factory: build the token codec and the auth gate from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::auth::AuthGate;
use crate::services::auth::{CredentialStore, TokenCodec};

pub fn build_token_codec(config: &Config) -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.jwt_expire_seconds,
    ))
}

pub fn build_auth_gate(
    config: &Config,
    tokens: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
) -> AuthGate {
    AuthGate::new(tokens, credentials, config.credential_lookup_timeout)
}
