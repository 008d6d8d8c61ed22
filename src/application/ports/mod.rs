pub mod identity_gateway;
pub mod local_cart_store;
pub mod remote_cart_store;
pub mod user_directory;

pub use identity_gateway::{AuthenticatedUser, IdentityGateway};
pub use local_cart_store::LocalCartStore;
pub use remote_cart_store::RemoteCartStore;
pub use user_directory::UserDirectory;
