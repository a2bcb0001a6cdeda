/*
 * Responsibility
 * - /posts handlers (CRUD, likes, comments)
 * - The {post_id} path segment is a public id; PublicPostId decodes it to the internal id
 * - Ownership (author or admin) is checked here against the caller's Identity
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::info;

use crate::{
    api::v1::{
        dto::{
            envelope::{Data, Empty, Envelope},
            pagination::Page,
            posts::{
                AuthorSummary, CommentResponse, CreateCommentRequest, CreatePostRequest,
                LikeResponse, ListPostsQuery, PostResponse, UpdatePostRequest, normalize_tags,
            },
        },
        extractors::{CurrentIdentity, Identity, public_id::PublicPostId},
    },
    error::AppError,
    repos::{
        comment_repo::{self, CommentRow},
        error::RepoError,
        like_repo,
        post_repo::{self, NewPost, PostChanges, PostFilter, PostRow},
    },
    state::AppState,
};

fn row_to_response(state: &AppState, row: PostRow) -> Result<PostResponse, AppError> {
    Ok(PostResponse {
        id: state.id_codec.encode(row.post_id)?,
        title: row.title,
        content: row.content,
        author: AuthorSummary {
            id: row.author_id,
            name: row.author_name,
            avatar: row.author_avatar,
        },
        tags: row.tags,
        image: row.image,
        is_published: row.is_published,
        view_count: row.view_count,
        like_count: row.like_count,
        comment_count: row.comment_count,
        comments: None,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn comment_to_response(state: &AppState, row: CommentRow) -> Result<CommentResponse, AppError> {
    Ok(CommentResponse {
        id: state.id_codec.encode(row.comment_id)?,
        post_id: state.id_codec.encode(row.post_id)?,
        user: AuthorSummary {
            id: row.user_id,
            name: row.user_name,
            avatar: row.user_avatar,
        },
        content: row.content,
        created_at: row.created_at,
    })
}

// 404 when the post is gone, 403 when the caller is neither author nor admin.
async fn ensure_can_modify(
    state: &AppState,
    identity: &Identity,
    post_id: i64,
) -> Result<(), AppError> {
    let author_id = post_repo::author_of(&state.db, post_id)
        .await?
        .ok_or(AppError::not_found("post"))?;

    if !identity.can_modify(author_id) {
        return Err(AppError::forbidden());
    }
    Ok(())
}

// The post can vanish between `ensure_exists` and a write that references it.
fn post_gone(e: RepoError) -> AppError {
    match e {
        RepoError::MissingReference => AppError::not_found("post"),
        other => other.into(),
    }
}

async fn ensure_exists(state: &AppState, post_id: i64) -> Result<(), AppError> {
    if !post_repo::exists(&state.db, post_id).await? {
        return Err(AppError::not_found("post"));
    }
    Ok(())
}

pub async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<Json<Envelope<Page<PostResponse>>>, AppError> {
    let Query(query) = query?;
    let page = query.page_query().resolve().map_err(AppError::validation)?;

    let filter = PostFilter {
        search: query.search(),
        tag: query.tag(),
    };

    let (rows, total) = tokio::try_join!(
        post_repo::list(&state.db, &filter, page.limit, page.offset()),
        post_repo::count(&state.db, &filter),
    )?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(row_to_response(&state, row)?);
    }

    Ok(Json(Envelope::ok(Page::new(data, total, page))))
}

/// Counts a view on every successful read. The post's comments come embedded, oldest first.
pub async fn get_post(
    State(state): State<AppState>,
    post_id: PublicPostId,
) -> Result<Json<Envelope<Data<PostResponse>>>, AppError> {
    let row = post_repo::get_and_record_view(&state.db, post_id.id)
        .await?
        .ok_or(AppError::not_found("post"))?;

    let comments = comment_repo::list_for_post(&state.db, post_id.id)
        .await?
        .into_iter()
        .map(|c| comment_to_response(&state, c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut post = row_to_response(&state, row)?;
    post.comments = Some(comments);

    Ok(Json(Envelope::data(post)))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Data<PostResponse>>>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::validation)?;

    let tags = normalize_tags(&req.tags);
    let row = post_repo::create(
        &state.db,
        NewPost {
            title: req.title.trim(),
            content: &req.content,
            author_id: identity.subject_id,
            tags: &tags,
            image: &req.image,
            is_published: req.is_published,
        },
    )
    .await?;

    info!(post_id = row.post_id, author_id = %identity.subject_id, "post created");

    let res = row_to_response(&state, row)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(res).with_message("post created")),
    ))
}

pub async fn update_post(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    post_id: PublicPostId,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<Envelope<Data<PostResponse>>>, AppError> {
    let Json(req) = payload?;

    ensure_can_modify(&state, &identity, post_id.id).await?;
    req.validate().map_err(AppError::validation)?;

    let tags = req.tags.as_deref().map(normalize_tags);
    let row = post_repo::update(
        &state.db,
        post_id.id,
        PostChanges {
            title: req.title.as_deref().map(str::trim),
            content: req.content.as_deref(),
            tags: tags.as_deref(),
            image: req.image.as_deref(),
            is_published: req.is_published,
        },
    )
    .await?
    .ok_or(AppError::not_found("post"))?;

    info!(post_id = post_id.id, by = %identity.subject_id, "post updated");

    Ok(Json(
        Envelope::data(row_to_response(&state, row)?).with_message("post updated"),
    ))
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    post_id: PublicPostId,
) -> Result<Json<Envelope<Empty>>, AppError> {
    ensure_can_modify(&state, &identity, post_id.id).await?;

    if !post_repo::delete(&state.db, post_id.id).await? {
        return Err(AppError::not_found("post"));
    }

    info!(post_id = post_id.id, by = %identity.subject_id, "post deleted");

    Ok(Json(Envelope::message("post deleted")))
}

pub async fn like_post(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    post_id: PublicPostId,
) -> Result<Json<Envelope<LikeResponse>>, AppError> {
    ensure_exists(&state, post_id.id).await?;

    if !like_repo::add(&state.db, post_id.id, identity.subject_id)
        .await
        .map_err(post_gone)?
    {
        return Err(AppError::bad_request(
            "ALREADY_LIKED",
            "you already liked this post",
        ));
    }

    let like_count = like_repo::count(&state.db, post_id.id).await?;
    Ok(Json(
        Envelope::ok(LikeResponse { like_count }).with_message("like added"),
    ))
}

pub async fn unlike_post(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    post_id: PublicPostId,
) -> Result<Json<Envelope<LikeResponse>>, AppError> {
    ensure_exists(&state, post_id.id).await?;

    if !like_repo::remove(&state.db, post_id.id, identity.subject_id).await? {
        return Err(AppError::bad_request(
            "NOT_LIKED",
            "you have not liked this post",
        ));
    }

    let like_count = like_repo::count(&state.db, post_id.id).await?;
    Ok(Json(
        Envelope::ok(LikeResponse { like_count }).with_message("like removed"),
    ))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    post_id: PublicPostId,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Data<CommentResponse>>>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::validation)?;

    ensure_exists(&state, post_id.id).await?;

    let row = comment_repo::create(&state.db, post_id.id, identity.subject_id, req.content.trim())
        .await
        .map_err(post_gone)?;

    info!(post_id = post_id.id, user_id = %identity.subject_id, "comment added");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(comment_to_response(&state, row)?).with_message("comment added")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanished_post_is_404() {
        assert!(matches!(
            post_gone(RepoError::MissingReference),
            AppError::NotFound { resource: "post" }
        ));
    }

    #[test]
    fn other_repo_errors_pass_through() {
        assert!(matches!(
            post_gone(RepoError::Db(sqlx::Error::PoolTimedOut)),
            AppError::Internal
        ));
    }
}
