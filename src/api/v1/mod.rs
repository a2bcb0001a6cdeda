/*
 * Responsibility
 * - v1 public surface (routes() and the modules handlers/tests reach into)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
