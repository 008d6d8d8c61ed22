use crate::domain::entities::Cart;
use crate::shared::error::CartError;
use async_trait::async_trait;

/// Persistence for the unauthenticated guest cart: a single serialized blob
/// that survives restarts but not device loss.
///
/// The operations are async only for uniformity with the remote store; the
/// backing storage is expected to be local and synchronous.
#[async_trait]
pub trait LocalCartStore: Send + Sync {
    /// Reads the persisted cart. A missing blob yields an empty cart; a
    /// corrupt blob is recovered to an empty cart and logged, never
    /// surfaced as an error.
    async fn load(&self) -> Result<Cart, CartError>;

    /// Overwrites the blob with the full current line set.
    async fn save(&self, cart: &Cart) -> Result<(), CartError>;

    /// Removes the blob entirely. Idempotent.
    async fn clear(&self) -> Result<(), CartError>;
}
