/*
 * Responsibility
 *  - Bundle core and types, control what handlers can see
 */
mod core;
mod types;

pub use types::*;
