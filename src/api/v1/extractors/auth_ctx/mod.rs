/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Give handlers the authenticated request context (Identity)
 * - axum-specific code stays in core, the type itself in types
 *
 * Public API:
 * - Identity
 * - CurrentIdentity
 */

mod core;
mod types;

pub use core::CurrentIdentity;
pub use types::Identity;
