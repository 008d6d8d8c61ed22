use crate::application::ports::RemoteCartStore;
use crate::domain::entities::{CartLine, CartLineDraft};
use crate::domain::value_objects::{LineId, UserId};
use crate::shared::error::CartError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// SQLite-backed remote cart collection.
///
/// Rows are scoped by the store-side user row id; the port API speaks the
/// identity boundary's auth id and the mapping happens here. Line uniqueness
/// is enforced on the full (user, product, size, color) variant key.
pub struct SqliteCartStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: String,
    user_id: String,
    product_id: String,
    name: String,
    unit_price_minor: i64,
    original_unit_price_minor: Option<i64>,
    image_url: String,
    category: String,
    quantity: i64,
    size: Option<String>,
    color: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl CartItemRow {
    fn into_line(self) -> Result<CartLine, CartError> {
        Ok(CartLine {
            id: LineId::new(self.id).map_err(CartError::Database)?,
            product_id: self.product_id,
            name: self.name,
            unit_price_minor: self.unit_price_minor,
            original_unit_price_minor: self.original_unit_price_minor,
            image_url: self.image_url,
            category: self.category,
            quantity: u32::try_from(self.quantity)
                .map_err(|_| CartError::Database("Negative quantity in cart row".to_string()))?,
            size: self.size,
            color: self.color,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SqliteCartStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn user_row_id(&self, user: &UserId) -> Result<Option<String>, CartError> {
        let row_id: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE auth_id = ?1")
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row_id)
    }

    async fn require_user(&self, user: &UserId) -> Result<String, CartError> {
        self.user_row_id(user)
            .await?
            .ok_or_else(|| CartError::NotFound("User not found".to_string()))
    }

    /// Loads a line and verifies it belongs to the given user row.
    async fn owned_row(&self, user_row: &str, line: &LineId) -> Result<CartItemRow, CartError> {
        let row = sqlx::query_as::<_, CartItemRow>("SELECT * FROM cart_items WHERE id = ?1")
            .bind(line.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) if row.user_id == user_row => Ok(row),
            _ => Err(CartError::NotFound(
                "Cart line not found or does not belong to this user".to_string(),
            )),
        }
    }
}

#[async_trait]
impl RemoteCartStore for SqliteCartStore {
    async fn fetch(&self, user: &UserId) -> Result<Vec<CartLine>, CartError> {
        // A user record that does not exist yet is an empty cart, not an
        // error: provisioning may lag sign-in by one round trip.
        let Some(user_row) = self.user_row_id(user).await? else {
            return Ok(vec![]);
        };

        // rowid breaks ties between lines inserted in the same millisecond,
        // keeping insertion order stable.
        let rows = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT * FROM cart_items
            WHERE user_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(&user_row)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartItemRow::into_line).collect()
    }

    async fn upsert_line(
        &self,
        user: &UserId,
        draft: &CartLineDraft,
        quantity_delta: u32,
    ) -> Result<CartLine, CartError> {
        let user_row = self.require_user(user).await?;
        let now = chrono::Utc::now().timestamp_millis();

        let existing = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT * FROM cart_items
            WHERE user_id = ?1 AND product_id = ?2 AND size IS ?3 AND color IS ?4
            "#,
        )
        .bind(&user_row)
        .bind(&draft.product_id)
        .bind(&draft.size)
        .bind(&draft.color)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(mut row) = existing {
            sqlx::query(
                r#"
                UPDATE cart_items
                SET quantity = quantity + ?1, updated_at = ?2
                WHERE id = ?3
                "#,
            )
            .bind(i64::from(quantity_delta))
            .bind(now)
            .bind(&row.id)
            .execute(&self.pool)
            .await?;

            row.quantity += i64::from(quantity_delta);
            row.updated_at = now;
            return row.into_line();
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, user_id, product_id, name, unit_price_minor,
                original_unit_price_minor, image_url, category, quantity,
                size, color, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&id)
        .bind(&user_row)
        .bind(&draft.product_id)
        .bind(&draft.name)
        .bind(draft.unit_price_minor)
        .bind(draft.original_unit_price_minor)
        .bind(&draft.image_url)
        .bind(&draft.category)
        .bind(i64::from(quantity_delta))
        .bind(&draft.size)
        .bind(&draft.color)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("Added cart line {} for product {}", id, draft.product_id);

        Ok(CartLine {
            id: LineId::new(id).map_err(CartError::Database)?,
            product_id: draft.product_id.clone(),
            name: draft.name.clone(),
            unit_price_minor: draft.unit_price_minor,
            original_unit_price_minor: draft.original_unit_price_minor,
            image_url: draft.image_url.clone(),
            category: draft.category.clone(),
            quantity: quantity_delta,
            size: draft.size.clone(),
            color: draft.color.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn set_quantity(
        &self,
        user: &UserId,
        line: &LineId,
        quantity: u32,
    ) -> Result<Option<CartLine>, CartError> {
        let user_row = self.require_user(user).await?;
        let mut row = self.owned_row(&user_row, line).await?;

        if quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = ?1")
                .bind(line.as_str())
                .execute(&self.pool)
                .await?;
            info!("Deleted cart line {} on zero quantity", line);
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query("UPDATE cart_items SET quantity = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(i64::from(quantity))
            .bind(now)
            .bind(line.as_str())
            .execute(&self.pool)
            .await?;

        row.quantity = i64::from(quantity);
        row.updated_at = now;
        row.into_line().map(Some)
    }

    async fn remove_line(&self, user: &UserId, line: &LineId) -> Result<(), CartError> {
        let user_row = self.require_user(user).await?;
        self.owned_row(&user_row, line).await?;

        sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(line.as_str())
            .execute(&self.pool)
            .await?;

        info!("Removed cart line {}", line);
        Ok(())
    }

    async fn clear(&self, user: &UserId) -> Result<(), CartError> {
        let user_row = self.require_user(user).await?;

        // Single statement so no reader observes a partially cleared cart.
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(&user_row)
            .execute(&self.pool)
            .await?;

        info!("Cleared cart for user {}", user);
        Ok(())
    }
}
