pub mod credential_store;
pub mod factory;
pub mod token_codec;

pub use credential_store::{CredentialRecord, CredentialStore, Role, StoredCredential};
pub use factory::{build_auth_gate, build_token_codec};
pub use token_codec::{IssuedToken, TokenCodec, TokenError};
