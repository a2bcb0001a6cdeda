/*
 * Responsibility
 * - Public face of the middleware layer
 * - auth: bearer gate + role gate (route-scoped)
 * - cors / http / security_headers: applied once to the whole app
 * - rate_limit: per-client budget on the API routes
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod rate_limit;
pub mod security_headers;
