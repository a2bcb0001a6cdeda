/*
 * Responsibility
 * - The authenticated-identity type handlers see
 * - The auth gate builds it and puts it into request extensions; handlers only receive this type
 *
 * Notes
 * - Token verification and the credential lookup belong to middleware/services
 * - Lives for one request, never persisted
 */

use uuid::Uuid;

use crate::services::auth::Role;

/// The principal behind an authenticated request.
///
/// - `subject_id` is the users."userId" the token vouched for
/// - `role` comes from the credential store at request time, not from the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(subject_id: Uuid, role: Role) -> Self {
        Self { subject_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owner-or-admin rule used by the user/post write endpoints.
    pub fn can_modify(&self, owner_id: Uuid) -> bool {
        self.subject_id == owner_id || self.is_admin()
    }
}
