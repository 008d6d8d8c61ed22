pub mod entities;
pub mod value_objects;

pub use entities::{Cart, CartLine, CartLineDraft, StoreUser, UserProfileDraft};
pub use value_objects::{LineId, UserId};
