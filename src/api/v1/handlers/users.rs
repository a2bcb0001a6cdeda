/*
 * Responsibility
 * - /users handlers
 * - Admin-only routes are guarded by the role gate in routes.rs; self-or-admin is checked here
 * - Users keep their UUID as the public id (no encoding)
 */
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::{
            envelope::{Data, Empty, Envelope},
            pagination::{Page, PageQuery},
            users::{UpdateUserRequest, UserResponse, UserStatsResponse},
        },
        extractors::CurrentIdentity,
    },
    error::AppError,
    repos::user_repo,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Envelope<Page<UserResponse>>>, AppError> {
    let Query(query) = query?;
    let page = query.resolve().map_err(AppError::validation)?;

    let (rows, total) = tokio::try_join!(
        user_repo::list_active(&state.db, page.limit, page.offset()),
        user_repo::count_active(&state.db),
    )?;

    let data = rows.into_iter().map(UserResponse::from).collect();
    Ok(Json(Envelope::ok(Page::new(data, total, page))))
}

pub async fn user_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Data<UserStatsResponse>>>, AppError> {
    let stats = user_repo::stats(&state.db).await?;
    Ok(Json(Envelope::data(stats.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Data<UserResponse>>>, AppError> {
    let Path(user_id) = user_id?;

    let row = user_repo::get(&state.db, user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(Envelope::data(row.into())))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    user_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Envelope<Data<UserResponse>>>, AppError> {
    let Path(user_id) = user_id?;
    let Json(req) = payload?;

    if !identity.can_modify(user_id) {
        return Err(AppError::forbidden());
    }
    req.validate().map_err(AppError::validation)?;

    let row = user_repo::update_profile(
        &state.db,
        user_id,
        req.name.as_deref().map(str::trim),
        req.avatar.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("user"))?;

    info!(user_id = %user_id, by = %identity.subject_id, "user updated");

    Ok(Json(
        Envelope::data(row.into()).with_message("user updated"),
    ))
}

/// Soft delete (deactivate). Admin only; an admin cannot deactivate themselves.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    let Path(user_id) = user_id?;

    if user_id == identity.subject_id {
        return Err(AppError::bad_request(
            "CANNOT_DEACTIVATE_SELF",
            "you cannot deactivate your own account",
        ));
    }

    if !user_repo::deactivate(&state.db, user_id).await? {
        return Err(AppError::not_found("user"));
    }

    info!(user_id = %user_id, by = %identity.subject_id, "user deactivated");

    Ok(Json(Envelope::message("user deactivated")))
}
