use crate::domain::entities::{CartLine, CartLineDraft};
use crate::domain::value_objects::{LineId, UserId};
use crate::shared::error::CartError;
use async_trait::async_trait;

/// Persistence for signed-in carts, keyed by the identity boundary's user id.
///
/// Every mutation carries the owning user and must reject lines belonging to
/// someone else with `CartError::NotFound`. The find-or-create in
/// `upsert_line` is not atomic across concurrent calls; callers must not
/// issue overlapping upserts for the same cart.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// All lines for the user. A user without a provisioned record yet yields
    /// an empty vec, since provisioning may lag sign-in by one round trip.
    async fn fetch(&self, user: &UserId) -> Result<Vec<CartLine>, CartError>;

    /// Increments the quantity of the line matching the draft's
    /// (product, size, color) key by `quantity_delta`, or inserts a new line
    /// with that quantity. Fails with `NotFound` when the user record is
    /// missing.
    async fn upsert_line(
        &self,
        user: &UserId,
        draft: &CartLineDraft,
        quantity_delta: u32,
    ) -> Result<CartLine, CartError>;

    /// Patches a line's quantity; zero deletes the line (documented contract,
    /// not an error) and returns `None`. Fails with `NotFound` when the line
    /// does not belong to the user.
    async fn set_quantity(
        &self,
        user: &UserId,
        line: &LineId,
        quantity: u32,
    ) -> Result<Option<CartLine>, CartError>;

    /// Deletes a line unconditionally. Fails with `NotFound` on ownership
    /// mismatch.
    async fn remove_line(&self, user: &UserId, line: &LineId) -> Result<(), CartError>;

    /// Deletes every line owned by the user in one step; no observer sees a
    /// partially cleared cart.
    async fn clear(&self, user: &UserId) -> Result<(), CartError>;
}
