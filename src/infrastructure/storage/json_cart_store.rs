use crate::application::ports::LocalCartStore;
use crate::domain::entities::{Cart, CartLine};
use crate::shared::error::CartError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// Guest cart persistence: one JSON blob on local disk, the library analogue
/// of a browser's string-keyed storage slot. Overwritten whole on every save;
/// concurrent writers are an accepted last-write-wins race.
pub struct JsonCartStore {
    path: PathBuf,
}

impl JsonCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LocalCartStore for JsonCartStore {
    async fn load(&self) -> Result<Cart, CartError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Cart::new()),
            Err(err) => return Err(CartError::Storage(err.to_string())),
        };

        match serde_json::from_slice::<Vec<CartLine>>(&bytes) {
            Ok(lines) => Ok(Cart::from_lines(lines)),
            Err(err) => {
                // Corrupt local state must not block shopping; fall back to
                // an empty cart.
                warn!(
                    "Failed to parse guest cart blob at {}: {}",
                    self.path.display(),
                    err
                );
                Ok(Cart::new())
            }
        }
    }

    async fn save(&self, cart: &Cart) -> Result<(), CartError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(cart.lines())?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CartError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CartError::Storage(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CartLineDraft;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonCartStore {
        JsonCartStore::new(dir.path().join("guest_cart.json"))
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.upsert(
            CartLineDraft {
                product_id: "p1".to_string(),
                name: "Linen Shirt".to_string(),
                unit_price_minor: 4599,
                original_unit_price_minor: None,
                image_url: "/images/p1.jpg".to_string(),
                category: "shirts".to_string(),
                size: Some("M".to_string()),
                color: Some("White".to_string()),
            },
            2,
        );
        cart
    }

    #[tokio::test]
    async fn load_missing_blob_returns_empty_cart() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let cart = store.load().await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let cart = sample_cart();

        store.save(&cart).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn load_corrupt_blob_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guest_cart.json");
        tokio::fs::write(&path, b"{not valid json!").await.unwrap();

        let store = JsonCartStore::new(path);
        let cart = store.load().await.unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_blob_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&sample_cart()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());

        // A second clear on a missing blob succeeds.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn save_overwrites_the_previous_blob() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&sample_cart()).await.unwrap();
        store.save(&Cart::new()).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }
}
