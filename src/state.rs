/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - db: PgPool, id_codec: IdCodec, gate: AuthGate, passwords, uploads
 * - Cheap to Clone (everything inside is Arc/Clone-cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::AuthGate;
use crate::services::{
    auth::{CredentialStore, TokenCodec},
    id_codec::IdCodec,
    password::PasswordHasher,
    upload::UploadStore,
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub id_codec: IdCodec,
    pub gate: AuthGate,
    pub passwords: PasswordHasher,
    pub uploads: UploadStore,
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn tokens(&self) -> &TokenCodec {
        self.gate.tokens()
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.gate.credentials()
    }
}
