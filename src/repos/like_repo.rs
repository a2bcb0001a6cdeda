/*
 * Responsibility
 * - post_likes: one row per (post, user)
 */
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

/// Returns false when the user already liked the post, `MissingReference` when the post is gone.
pub async fn add(pool: &PgPool, post_id: i64, user_id: Uuid) -> RepoResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO post_likes ("postId", "userId")
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(result.rows_affected() > 0)
}

/// Returns false when there was no like to remove.
pub async fn remove(pool: &PgPool, post_id: i64, user_id: Uuid) -> RepoResult<bool> {
    let result = sqlx::query(r#"DELETE FROM post_likes WHERE "postId" = $1 AND "userId" = $2"#)
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &PgPool, post_id: i64) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM post_likes WHERE "postId" = $1"#)
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    Ok(n)
}
