pub mod auth;
pub mod health;
pub mod posts;
pub mod upload;
pub mod users;
