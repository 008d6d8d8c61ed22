use crate::domain::entities::{StoreUser, UserProfileDraft};
use crate::domain::value_objects::UserId;
use crate::shared::error::CartError;
use async_trait::async_trait;

/// Store-side user records, provisioned from identity-boundary profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create-or-update keyed by the profile's auth id. Recomputes admin
    /// status and touches the update timestamp on every call.
    async fn provision(&self, profile: UserProfileDraft) -> Result<StoreUser, CartError>;

    async fn find_by_auth_id(&self, auth_id: &UserId) -> Result<Option<StoreUser>, CartError>;

    /// False for unknown users.
    async fn is_admin(&self, auth_id: &UserId) -> Result<bool, CartError>;
}
