use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub cart: CartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Serialized guest cart blob, relative to `data_dir`.
    pub guest_cart_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// When true, `add_item` prompts for sign-in before accepting guest additions.
    pub require_sign_in: bool,
    /// E-mail addresses granted admin status on provisioning.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/vitrine.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                guest_cart_file: "guest_cart.json".to_string(),
            },
            cart: CartConfig {
                require_sign_in: false,
                admin_emails: vec![],
            },
        }
    }
}

impl StorageConfig {
    pub fn guest_cart_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.guest_cart_file)
    }
}
