/*
 * Responsibility
 * - Request/response shapes for v1
 * - Request DTOs carry validate() (format checks only; no DB access)
 */
pub mod auth;
pub mod envelope;
pub mod pagination;
pub mod posts;
pub mod upload;
pub mod users;

pub(crate) mod rules;
