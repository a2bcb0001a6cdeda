/*
 * Responsibility
 * - comments on posts (create, list per post)
 * - Every row carries the commenter's name and avatar
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    #[sqlx(rename = "commentId")]
    pub comment_id: i64,
    #[sqlx(rename = "postId")]
    pub post_id: i64,
    #[sqlx(rename = "userId")]
    pub user_id: Uuid,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    #[sqlx(rename = "userAvatar")]
    pub user_avatar: String,
    pub content: String,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// `MissingReference` when the post disappeared before the insert.
pub async fn create(
    pool: &PgPool,
    post_id: i64,
    user_id: Uuid,
    content: &str,
) -> RepoResult<CommentRow> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        WITH c AS (
            INSERT INTO comments ("postId", "userId", content)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT c."commentId", c."postId", c."userId",
               u.name AS "userName", u.avatar AS "userAvatar",
               c.content, c."createdAt"
        FROM c
        JOIN users u ON u."userId" = c."userId"
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

/// Oldest first, the order they were written in.
pub async fn list_for_post(pool: &PgPool, post_id: i64) -> RepoResult<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c."commentId", c."postId", c."userId",
               u.name AS "userName", u.avatar AS "userAvatar",
               c.content, c."createdAt"
        FROM comments c
        JOIN users u ON u."userId" = c."userId"
        WHERE c."postId" = $1
        ORDER BY c."createdAt" ASC, c."commentId" ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
