/*
 * Responsibility
 * - /auth handlers: register, login, me, password change
 * - Tokens come from the same TokenCodec the auth gate verifies with
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::{
    api::v1::{
        dto::{
            auth::{
                AuthResponse, AuthUser, ChangePasswordRequest, LoginRequest, RegisterRequest,
                TokenResponse,
            },
            envelope::{Data, Envelope},
            users::UserResponse,
        },
        extractors::CurrentIdentity,
    },
    error::AppError,
    repos::{error::RepoError, user_repo},
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<AuthResponse>>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::validation)?;

    let email = req.normalized_email();
    let hash = state.passwords.hash(&req.password).await?;

    let row = user_repo::create(&state.db, req.name.trim(), &email, &hash)
        .await
        .map_err(|e| match e {
            RepoError::Conflict => {
                AppError::bad_request("EMAIL_TAKEN", "this email is already registered")
            }
            other => other.into(),
        })?;

    let issued = state.tokens().issue(row.id)?;

    info!(user_id = %row.id, "user registered");

    let body = AuthResponse {
        expires_in: issued.expires_in(),
        token: issued.token,
        user: AuthUser {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            last_login: None,
        },
    };

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(body).with_message("registration complete")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Envelope<AuthResponse>>, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::validation)?;

    let email = req.normalized_email();

    // Unknown email, wrong password and deactivated account all answer the same way.
    let Some(stored) = state.credentials().find_by_email_with_secret(&email).await? else {
        warn!("login failed: unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !state
        .passwords
        .verify(&req.password, &stored.password_hash)
        .await?
    {
        warn!(user_id = %stored.record.id, "login failed: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    if !stored.record.is_active {
        warn!(user_id = %stored.record.id, "login failed: account deactivated");
        return Err(AppError::InvalidCredentials);
    }

    let row = user_repo::touch_last_login(&state.db, stored.record.id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let issued = state.tokens().issue(row.id)?;

    info!(user_id = %row.id, "user logged in");

    Ok(Json(Envelope::ok(AuthResponse {
        expires_in: issued.expires_in(),
        token: issued.token,
        user: AuthUser {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            last_login: row.last_login,
        },
    })))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Envelope<Data<UserResponse>>>, AppError> {
    let row = user_repo::get(&state.db, identity.subject_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(Envelope::data(row.into())))
}

/// Issues a fresh token. Tokens issued before the change stay valid until they expire.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<Envelope<TokenResponse>>, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::validation)?;

    let current_hash = user_repo::password_hash(&state.db, identity.subject_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    if !state
        .passwords
        .verify(&req.current_password, &current_hash)
        .await?
    {
        return Err(AppError::bad_request(
            "WRONG_PASSWORD",
            "current password is incorrect",
        ));
    }

    let new_hash = state.passwords.hash(&req.new_password).await?;
    if !user_repo::update_password_hash(&state.db, identity.subject_id, &new_hash).await? {
        return Err(AppError::not_found("user"));
    }

    let issued = state.tokens().issue(identity.subject_id)?;

    info!(user_id = %identity.subject_id, "password changed");

    Ok(Json(
        Envelope::ok(TokenResponse {
            expires_in: issued.expires_in(),
            token: issued.token,
        })
        .with_message("password changed"),
    ))
}
