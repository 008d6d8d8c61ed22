use crate::domain::value_objects::UserId;
use serde::{Deserialize, Serialize};

/// Identity-boundary profile handed to the user directory on sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfileDraft {
    pub auth_id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// A provisioned store-side user record.
///
/// `id` is the store's own row id; `auth_id` is the identity boundary's
/// stable identifier and is the key every cart operation is scoped by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreUser {
    pub id: String,
    pub auth_id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub is_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoreUser {
    pub fn new(draft: UserProfileDraft, is_admin: bool) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            auth_id: draft.auth_id,
            email: draft.email,
            name: draft.name,
            image_url: draft.image_url,
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }
}
