/*
 * Responsibility
 * - posts CRUD (+ author name/avatar, like/comment counts on every read)
 * - Deletes cascade to post_likes / comments through the FK
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoResult;

// Projection shared by every query that returns a PostRow. Expects the post as `p`.
macro_rules! post_projection {
    () => {
        r#"
        SELECT
            p."postId", p.title, p.content, p."authorId", u.name AS "authorName", u.avatar AS "authorAvatar",
            p.tags, p.image, p."isPublished", p."viewCount",
            (SELECT COUNT(*) FROM post_likes l WHERE l."postId" = p."postId") AS "likeCount",
            (SELECT COUNT(*) FROM comments c WHERE c."postId" = p."postId") AS "commentCount",
            p."createdAt", p."updatedAt"
        FROM p
        JOIN users u ON u."userId" = p."authorId"
        "#
    };
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    #[sqlx(rename = "postId")]
    pub post_id: i64,

    pub title: String,
    pub content: String,

    #[sqlx(rename = "authorId")]
    pub author_id: Uuid,
    #[sqlx(rename = "authorName")]
    pub author_name: String,
    #[sqlx(rename = "authorAvatar")]
    pub author_avatar: String,

    pub tags: Vec<String>,
    pub image: String,

    #[sqlx(rename = "isPublished")]
    pub is_published: bool,
    #[sqlx(rename = "viewCount")]
    pub view_count: i64,
    #[sqlx(rename = "likeCount")]
    pub like_count: i64,
    #[sqlx(rename = "commentCount")]
    pub comment_count: i64,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Filters for the public listing. Only published posts are ever listed.
#[derive(Debug, Default, Clone)]
pub struct PostFilter<'a> {
    pub search: Option<&'a str>,
    pub tag: Option<&'a str>,
}

impl PostFilter<'_> {
    fn search_pattern(&self) -> Option<String> {
        self.search.map(|s| format!("%{}%", escape_like(s)))
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub author_id: Uuid,
    pub tags: &'a [String],
    pub image: &'a str,
    pub is_published: bool,
}

#[derive(Default)]
pub struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub tags: Option<&'a [String]>,
    pub image: Option<&'a str>,
    pub is_published: Option<bool>,
}

pub async fn list(
    pool: &PgPool,
    filter: &PostFilter<'_>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(concat!(
        r#"
        WITH p AS (
            SELECT * FROM posts
            WHERE "isPublished"
              AND ($1::text IS NULL OR title ILIKE $1 OR content ILIKE $1)
              AND ($2::text IS NULL OR $2 = ANY(tags))
        )
        "#,
        post_projection!(),
        r#"
        ORDER BY p."createdAt" DESC, p."postId" DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(filter.search_pattern())
    .bind(filter.tag)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count(pool: &PgPool, filter: &PostFilter<'_>) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM posts
        WHERE "isPublished"
          AND ($1::text IS NULL OR title ILIKE $1 OR content ILIKE $1)
          AND ($2::text IS NULL OR $2 = ANY(tags))
        "#,
    )
    .bind(filter.search_pattern())
    .bind(filter.tag)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Fetch a post and count the view in one statement.
pub async fn get_and_record_view(pool: &PgPool, post_id: i64) -> RepoResult<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(concat!(
        r#"
        WITH p AS (
            UPDATE posts SET "viewCount" = "viewCount" + 1
            WHERE "postId" = $1
            RETURNING *
        )
        "#,
        post_projection!()
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Author of the post, for ownership checks. `None` when the post does not exist.
pub async fn author_of(pool: &PgPool, post_id: i64) -> RepoResult<Option<Uuid>> {
    let author = sqlx::query_scalar(r#"SELECT "authorId" FROM posts WHERE "postId" = $1"#)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    Ok(author)
}

pub async fn exists(pool: &PgPool, post_id: i64) -> RepoResult<bool> {
    let found: bool =
        sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM posts WHERE "postId" = $1)"#)
            .bind(post_id)
            .fetch_one(pool)
            .await?;

    Ok(found)
}

pub async fn create(pool: &PgPool, new: NewPost<'_>) -> RepoResult<PostRow> {
    let row = sqlx::query_as::<_, PostRow>(concat!(
        r#"
        WITH p AS (
            INSERT INTO posts (title, content, "authorId", tags, image, "isPublished")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        )
        "#,
        post_projection!()
    ))
    .bind(new.title)
    .bind(new.content)
    .bind(new.author_id)
    .bind(new.tags)
    .bind(new.image)
    .bind(new.is_published)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    post_id: i64,
    changes: PostChanges<'_>,
) -> RepoResult<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(concat!(
        r#"
        WITH p AS (
            UPDATE posts
            SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                tags = COALESCE($4, tags),
                image = COALESCE($5, image),
                "isPublished" = COALESCE($6, "isPublished"),
                "updatedAt" = now()
            WHERE "postId" = $1
            RETURNING *
        )
        "#,
        post_projection!()
    ))
    .bind(post_id)
    .bind(changes.title)
    .bind(changes.content)
    .bind(changes.tags)
    .bind(changes.image)
    .bind(changes.is_published)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn delete(pool: &PgPool, post_id: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM posts
        WHERE "postId" = $1
        "#,
    )
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
