use std::sync::Arc;

use crate::application::ports::IdentityGateway;
use crate::application::services::CartService;
use crate::infrastructure::database::{ConnectionPool, SqliteCartStore, SqliteUserDirectory};
use crate::infrastructure::storage::JsonCartStore;
use crate::shared::{AppConfig, Result};

/// Wires the stores and the cart service together.
///
/// The identity gateway is the host's boundary (whatever auth provider the
/// embedding app talks to) and is injected rather than constructed here.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ConnectionPool>,
    pub cart_service: Arc<CartService>,
}

impl AppState {
    pub async fn new(config: &AppConfig, identity: Arc<dyn IdentityGateway>) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir)?;

        let pool = Arc::new(
            ConnectionPool::new(&config.database.url, config.database.max_connections).await?,
        );
        pool.migrate().await?;

        let local = Arc::new(JsonCartStore::new(config.storage.guest_cart_path()));
        let remote = Arc::new(SqliteCartStore::new(pool.get_pool().clone()));
        let directory = Arc::new(SqliteUserDirectory::new(
            pool.get_pool().clone(),
            config.cart.admin_emails.clone(),
        ));

        let cart_service = Arc::new(CartService::new(
            identity,
            local,
            remote,
            directory,
            &config.cart,
        ));

        Ok(Self { pool, cart_service })
    }
}
