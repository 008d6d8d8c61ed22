pub mod json_cart_store;

pub use json_cart_store::JsonCartStore;
