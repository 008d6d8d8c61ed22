use crate::application::ports::UserDirectory;
use crate::domain::entities::{StoreUser, UserProfileDraft};
use crate::domain::value_objects::UserId;
use crate::shared::error::CartError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

/// SQLite-backed store-side user records.
///
/// Admin status is derived from a configured e-mail allowlist and recomputed
/// on every provision call.
pub struct SqliteUserDirectory {
    pool: SqlitePool,
    admin_emails: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    auth_id: String,
    email: String,
    name: Option<String>,
    image_url: Option<String>,
    is_admin: bool,
    created_at: i64,
    updated_at: i64,
}

impl UserRow {
    fn into_user(self) -> Result<StoreUser, CartError> {
        Ok(StoreUser {
            id: self.id,
            auth_id: UserId::new(self.auth_id).map_err(CartError::Database)?,
            email: self.email,
            name: self.name,
            image_url: self.image_url,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool, admin_emails: Vec<String>) -> Self {
        Self { pool, admin_emails }
    }

    async fn fetch_by_auth_id(&self, auth_id: &UserId) -> Result<Option<UserRow>, CartError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE auth_id = ?1")
            .bind(auth_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn provision(&self, profile: UserProfileDraft) -> Result<StoreUser, CartError> {
        let is_admin = self.admin_emails.contains(&profile.email);
        let now = chrono::Utc::now().timestamp_millis();

        if let Some(existing) = self.fetch_by_auth_id(&profile.auth_id).await? {
            sqlx::query(
                r#"
                UPDATE users
                SET email = ?1, name = ?2, image_url = ?3, is_admin = ?4, updated_at = ?5
                WHERE id = ?6
                "#,
            )
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(&profile.image_url)
            .bind(is_admin)
            .bind(now)
            .bind(&existing.id)
            .execute(&self.pool)
            .await?;

            return Ok(StoreUser {
                id: existing.id,
                auth_id: profile.auth_id,
                email: profile.email,
                name: profile.name,
                image_url: profile.image_url,
                is_admin,
                created_at: existing.created_at,
                updated_at: now,
            });
        }

        let user = StoreUser::new(profile, is_admin);
        sqlx::query(
            r#"
            INSERT INTO users (id, auth_id, email, name, image_url, is_admin, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(user.auth_id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Provisioned user {}", user.auth_id);
        Ok(user)
    }

    async fn find_by_auth_id(&self, auth_id: &UserId) -> Result<Option<StoreUser>, CartError> {
        match self.fetch_by_auth_id(auth_id).await? {
            Some(row) => row.into_user().map(Some),
            None => Ok(None),
        }
    }

    async fn is_admin(&self, auth_id: &UserId) -> Result<bool, CartError> {
        Ok(self
            .fetch_by_auth_id(auth_id)
            .await?
            .map(|row| row.is_admin)
            .unwrap_or(false))
    }
}
