//! Authorization assertions for sharing workflows
//!
//! Small composable checks, each guarding one rule. Service workflows run
//! them in a fixed order so a request failing several rules always reports
//! the same one: session first, then self-share, then ownership, then
//! share existence, then modify rights.

use promptforge_common::{PromptForgeError, UserId};
use thiserror::Error;

use crate::model::PromptShare;

/// Which mutation a share-modify check is guarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAction {
    /// Changing the grant's permission
    Update,
    /// Revoking the grant
    Delete,
}

/// A rejected sharing operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareAuthorizationError {
    /// No authenticated user on the request
    #[error("Session expired, sign in again to manage sharing")]
    SessionExpired,

    /// The actor tried to share a prompt with themselves
    #[error("Cannot share a prompt with yourself")]
    SelfShare,

    /// The actor does not own the prompt being shared
    #[error("Only the prompt owner can share it")]
    NotPromptOwner,

    /// The referenced share grant does not exist
    #[error("Share not found")]
    ShareNotFound,

    /// The actor may not change this grant's permission
    #[error("Only the share creator or the prompt owner can update a share")]
    UnauthorizedUpdate,

    /// The actor may not revoke this grant
    #[error("Only the share creator or the prompt owner can delete a share")]
    UnauthorizedDelete,
}

impl From<ShareAuthorizationError> for PromptForgeError {
    fn from(error: ShareAuthorizationError) -> Self {
        match error {
            ShareAuthorizationError::SessionExpired => PromptForgeError::SessionExpired,
            ShareAuthorizationError::ShareNotFound => PromptForgeError::ShareNotFound,
            other => PromptForgeError::Authorization {
                message: other.to_string(),
            },
        }
    }
}

/// Require an authenticated user
pub fn assert_session(actor: Option<UserId>) -> Result<UserId, ShareAuthorizationError> {
    actor.ok_or(ShareAuthorizationError::SessionExpired)
}

/// Refuse grants from a user to themselves
pub fn assert_not_self_share(
    actor: UserId,
    shared_with: UserId,
) -> Result<(), ShareAuthorizationError> {
    if actor == shared_with {
        return Err(ShareAuthorizationError::SelfShare);
    }
    Ok(())
}

/// Require the actor to own the prompt
pub fn assert_prompt_owner(actor: UserId, owner: UserId) -> Result<(), ShareAuthorizationError> {
    if actor != owner {
        return Err(ShareAuthorizationError::NotPromptOwner);
    }
    Ok(())
}

/// Require the referenced share grant to exist
pub fn assert_share_exists(
    share: Option<&PromptShare>,
) -> Result<&PromptShare, ShareAuthorizationError> {
    share.ok_or(ShareAuthorizationError::ShareNotFound)
}

/// Require the actor to be allowed to modify a grant
///
/// The share creator and the prompt owner may update or delete a grant;
/// nobody else may, including the grantee.
pub fn assert_share_modify_authorization(
    share: &PromptShare,
    actor: UserId,
    is_prompt_owner: bool,
    action: ShareAction,
) -> Result<(), ShareAuthorizationError> {
    if share.shared_by == actor || is_prompt_owner {
        return Ok(());
    }
    Err(match action {
        ShareAction::Update => ShareAuthorizationError::UnauthorizedUpdate,
        ShareAction::Delete => ShareAuthorizationError::UnauthorizedDelete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SharePermission;
    use chrono::Utc;
    use promptforge_common::{PromptId, ShareId};

    fn share(shared_by: UserId, shared_with: UserId) -> PromptShare {
        PromptShare {
            id: ShareId::new(),
            prompt_id: PromptId::new(),
            shared_with,
            permission: SharePermission::Read,
            shared_by,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_assertion() {
        let user = UserId::new();
        assert_eq!(assert_session(Some(user)), Ok(user));
        assert_eq!(
            assert_session(None),
            Err(ShareAuthorizationError::SessionExpired)
        );
    }

    #[test]
    fn test_self_share_refused() {
        let user = UserId::new();
        assert_eq!(
            assert_not_self_share(user, user),
            Err(ShareAuthorizationError::SelfShare)
        );
        assert!(assert_not_self_share(user, UserId::new()).is_ok());
    }

    #[test]
    fn test_owner_assertion() {
        let owner = UserId::new();
        assert!(assert_prompt_owner(owner, owner).is_ok());
        assert_eq!(
            assert_prompt_owner(UserId::new(), owner),
            Err(ShareAuthorizationError::NotPromptOwner)
        );
    }

    #[test]
    fn test_share_existence() {
        let grant = share(UserId::new(), UserId::new());
        assert!(assert_share_exists(Some(&grant)).is_ok());
        assert_eq!(
            assert_share_exists(None).map(|_| ()),
            Err(ShareAuthorizationError::ShareNotFound)
        );
    }

    #[test]
    fn test_modify_rights() {
        let creator = UserId::new();
        let grantee = UserId::new();
        let stranger = UserId::new();
        let grant = share(creator, grantee);

        // The creator may modify
        assert!(
            assert_share_modify_authorization(&grant, creator, false, ShareAction::Update).is_ok()
        );
        // The prompt owner may modify even without being the creator
        assert!(
            assert_share_modify_authorization(&grant, stranger, true, ShareAction::Delete).is_ok()
        );
        // The grantee may not
        assert_eq!(
            assert_share_modify_authorization(&grant, grantee, false, ShareAction::Update),
            Err(ShareAuthorizationError::UnauthorizedUpdate)
        );
        assert_eq!(
            assert_share_modify_authorization(&grant, grantee, false, ShareAction::Delete),
            Err(ShareAuthorizationError::UnauthorizedDelete)
        );
    }

    #[test]
    fn test_error_mapping() {
        let error: PromptForgeError = ShareAuthorizationError::SessionExpired.into();
        assert!(matches!(error, PromptForgeError::SessionExpired));

        let error: PromptForgeError = ShareAuthorizationError::ShareNotFound.into();
        assert!(error.is_not_found());

        let error: PromptForgeError = ShareAuthorizationError::NotPromptOwner.into();
        assert!(matches!(error, PromptForgeError::Authorization { .. }));
    }
}
