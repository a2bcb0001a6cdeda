/*
 * Responsibility
 * - Per-resource id types (tag type + alias)
 * - Everything `pub` here is re-exported through mod.rs
 */
use super::core::PublicId;

// posts
pub enum PostTag {}
pub type PublicPostId = PublicId<PostTag>;
