/*
 * Responsibility
 * - v1 URL layout
 * - Three groups, merged at the end:
 *   public    : health, register/login, post reads
 *   protected : everything behind the auth gate
 *   admin     : protected + role gate [admin]
 * - Both gates are route_layers, so unknown paths fall through to the 404 fallback
 */
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::middleware::auth::{access, role};
use crate::services::auth::Role;
use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{change_password, login, me, register},
    health::health,
    posts::{
        add_comment, create_post, delete_post, get_post, like_post, list_posts, unlike_post,
        update_post,
    },
    upload::{delete_upload, upload_image},
    users::{delete_user, get_user, list_users, update_user, user_stats},
};

// multipart framing on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/posts", get(list_posts))
        .route("/posts/{post_id}", get(get_post));

    let admin = role::apply(
        Router::new()
            .route("/users", get(list_users))
            .route("/users/stats", get(user_stats))
            .route("/users/{user_id}", delete(delete_user)),
        &[Role::Admin],
    );

    let upload_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD_BYTES;

    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
        .route("/users/{user_id}", get(get_user).put(update_user))
        .route("/posts", post(create_post))
        .route("/posts/{post_id}", put(update_post).delete(delete_post))
        .route("/posts/{post_id}/like", post(like_post).delete(unlike_post))
        .route("/posts/{post_id}/comments", post(add_comment))
        .route(
            "/upload",
            post(upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/upload/{filename}", delete(delete_upload))
        .merge(admin);

    let protected = access::apply(protected, state.gate.clone());

    public.merge(protected)
}
