use crate::domain::value_objects::UserId;
use crate::shared::error::CartError;
use async_trait::async_trait;

/// Profile the identity boundary reports for the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// Boundary to the external authentication provider.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// The currently signed-in user, or `None` when signed out.
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, CartError>;

    /// Asks the user to sign in out-of-band, showing `message` as the
    /// reason. Resolves `true` once sign-in completed, `false` if the prompt
    /// was dismissed.
    async fn prompt_sign_in(&self, message: &str) -> Result<bool, CartError>;
}
