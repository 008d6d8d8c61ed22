pub mod line_id;
pub mod user_id;

pub use line_id::LineId;
pub use user_id::UserId;
