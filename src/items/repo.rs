use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Item record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Item {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        location: &str,
    ) -> anyhow::Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (user_id, name, location)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, location, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(location)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    /// Fetch by id with no owner clause; the handler decides between
    /// NotFound and Forbidden.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, user_id, name, location, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(item)
    }

    /// One page of the owner's items, optionally filtered by a
    /// case-insensitive substring over name OR location. Ordered by
    /// creation time (id as tiebreak) so pages are stable.
    pub async fn list_page(
        db: &PgPool,
        user_id: Uuid,
        filter: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Item>> {
        let rows = match filter {
            Some(q) if !q.is_empty() => {
                sqlx::query_as::<_, Item>(
                    r#"
                    SELECT id, user_id, name, location, created_at, updated_at
                    FROM items
                    WHERE user_id = $1 AND (name ILIKE $2 OR location ILIKE $2)
                    ORDER BY created_at ASC, id ASC
                    LIMIT $3 OFFSET $4
                    "#,
                )
                .bind(user_id)
                .bind(format!("%{}%", q))
                .bind(limit)
                .bind(offset)
                .fetch_all(db)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Item>(
                    r#"
                    SELECT id, user_id, name, location, created_at, updated_at
                    FROM items
                    WHERE user_id = $1
                    ORDER BY created_at ASC, id ASC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(db)
                .await?
            }
        };
        Ok(rows)
    }

    /// Count of all matching rows, not just the requested page.
    pub async fn count(
        db: &PgPool,
        user_id: Uuid,
        filter: Option<&str>,
    ) -> anyhow::Result<i64> {
        let total = match filter {
            Some(q) if !q.is_empty() => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM items
                    WHERE user_id = $1 AND (name ILIKE $2 OR location ILIKE $2)
                    "#,
                )
                .bind(user_id)
                .bind(format!("%{}%", q))
                .fetch_one(db)
                .await?
            }
            _ => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COUNT(*)
                    FROM items
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .fetch_one(db)
                .await?
            }
        };
        Ok(total)
    }

    /// Partial update; `updated_at` is refreshed unconditionally, even
    /// when both fields are absent.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        location: Option<&str>,
    ) -> anyhow::Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, name, location, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(location)
        .fetch_one(db)
        .await?;
        Ok(item)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
