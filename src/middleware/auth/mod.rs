pub mod access;
pub mod rejection;
pub mod role;

pub use access::{AuthGate, GateError};
pub use rejection::{AuthRejection, GateStage};
pub use role::{GateDecision, RoleGate};
