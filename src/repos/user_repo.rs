/*
 * Responsibility
 * - SQLx access to the users table
 * - Takes a PgPool and provides CRUD; deletion is a soft deactivate
 * - Backs the CredentialStore the auth gate and login flow read from
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::{CredentialRecord, CredentialStore, Role, StoredCredential};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub avatar: String,
    #[sqlx(rename = "isActive")]
    pub is_active: bool,
    #[sqlx(rename = "lastLogin")]
    pub last_login: Option<DateTime<Utc>>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    #[sqlx(rename = "userId")]
    id: Uuid,
    email: String,
    #[sqlx(try_from = "String")]
    role: Role,
    #[sqlx(rename = "isActive")]
    is_active: bool,
}

#[derive(FromRow)]
struct SecretRow {
    #[sqlx(flatten)]
    credential: CredentialRow,
    #[sqlx(rename = "passwordHash")]
    password_hash: String,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct UserStats {
    #[sqlx(rename = "totalUsers")]
    pub total_users: i64,
    #[sqlx(rename = "newUsersThisMonth")]
    pub new_users_this_month: i64,
    #[sqlx(rename = "adminUsers")]
    pub admin_users: i64,
    #[sqlx(rename = "regularUsers")]
    pub regular_users: i64,
}

impl From<CredentialRow> for CredentialRecord {
    fn from(row: CredentialRow) -> Self {
        CredentialRecord {
            id: row.id,
            email: row.email,
            role: row.role,
            is_active: row.is_active,
        }
    }
}

/// `email` is expected to be lowercased by the caller. A taken email is `RepoError::Conflict`.
pub async fn create(
    db: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> RepoResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (name, email, "passwordHash")
        VALUES ($1, $2, $3)
        RETURNING "userId", name, email, role, avatar, "isActive", "lastLogin", "createdAt", "updatedAt"
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

/// Active users only; deactivated accounts read as absent.
pub async fn get(db: &PgPool, user_id: Uuid) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT "userId", name, email, role, avatar, "isActive", "lastLogin", "createdAt", "updatedAt"
        FROM users
        WHERE "userId" = $1 AND "isActive"
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn list_active(db: &PgPool, limit: i64, offset: i64) -> RepoResult<Vec<UserRow>> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT "userId", name, email, role, avatar, "isActive", "lastLogin", "createdAt", "updatedAt"
        FROM users
        WHERE "isActive"
        ORDER BY "createdAt" DESC, "userId"
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn count_active(db: &PgPool) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE "isActive""#)
        .fetch_one(db)
        .await?;

    Ok(total)
}

pub async fn stats(db: &PgPool) -> RepoResult<UserStats> {
    let stats = sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            COUNT(*) AS "totalUsers",
            COUNT(*) FILTER (WHERE "createdAt" >= date_trunc('month', now())) AS "newUsersThisMonth",
            COUNT(*) FILTER (WHERE role = 'admin') AS "adminUsers",
            COUNT(*) FILTER (WHERE role = 'user') AS "regularUsers"
        FROM users
        WHERE "isActive"
        "#,
    )
    .fetch_one(db)
    .await?;

    Ok(stats)
}

pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    avatar: Option<&str>,
) -> RepoResult<Option<UserRow>> {
    // None leaves the column as is
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET
            name = COALESCE($2, name),
            avatar = COALESCE($3, avatar),
            "updatedAt" = now()
        WHERE "userId" = $1 AND "isActive"
        RETURNING "userId", name, email, role, avatar, "isActive", "lastLogin", "createdAt", "updatedAt"
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(avatar)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Soft delete. Returns false when the user is unknown or already inactive.
pub async fn deactivate(db: &PgPool, user_id: Uuid) -> RepoResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET "isActive" = FALSE, "updatedAt" = now()
        WHERE "userId" = $1 AND "isActive"
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_login(db: &PgPool, user_id: Uuid) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET "lastLogin" = now()
        WHERE "userId" = $1
        RETURNING "userId", name, email, role, avatar, "isActive", "lastLogin", "createdAt", "updatedAt"
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn password_hash(db: &PgPool, user_id: Uuid) -> RepoResult<Option<String>> {
    let hash = sqlx::query_scalar(
        r#"SELECT "passwordHash" FROM users WHERE "userId" = $1 AND "isActive""#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(hash)
}

pub async fn update_password_hash(db: &PgPool, user_id: Uuid, hash: &str) -> RepoResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET "passwordHash" = $2, "updatedAt" = now()
        WHERE "userId" = $1 AND "isActive"
        "#,
    )
    .bind(user_id)
    .bind(hash)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// `CredentialStore` over the users table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<CredentialRecord>> {
        // inactive rows are returned too; the gate decides what they mean
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT "userId", email, role, "isActive"
            FROM users
            WHERE "userId" = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(CredentialRecord::from))
    }

    async fn find_by_email_with_secret(&self, email: &str) -> RepoResult<Option<StoredCredential>> {
        let row = sqlx::query_as::<_, SecretRow>(
            r#"
            SELECT "userId", email, role, "isActive", "passwordHash"
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| StoredCredential {
            record: r.credential.into(),
            password_hash: r.password_hash,
        }))
    }
}
