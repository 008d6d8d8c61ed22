pub mod cart;
pub mod user;

pub use cart::{Cart, CartLine, CartLineDraft};
pub use user::{StoreUser, UserProfileDraft};
