use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::{AdminUser, OptionalAdmin},
    error::ApiError,
    posts::dto::{CreatePostRequest, DeleteResponse},
    posts::repo::{NewPost, Post, PostPatch},
    state::AppState,
};

/// Admin clients ask for the unfiltered list with this header alongside
/// their token; without both, the public projection is served.
const ADMIN_VIEW_HEADER: &str = "x-admin";

#[instrument(skip(state, headers))]
pub async fn list_posts(
    State(state): State<AppState>,
    OptionalAdmin(claims): OptionalAdmin,
    headers: HeaderMap,
) -> Result<Json<Vec<Post>>, ApiError> {
    let admin_view = claims.is_some()
        && headers
            .get(ADMIN_VIEW_HEADER)
            .and_then(|v| v.to_str().ok())
            == Some("true");

    let posts = if admin_view {
        Post::list_all(&state.db).await?
    } else {
        Post::list_published(&state.db).await?
    };
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    OptionalAdmin(claims): OptionalAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = Post::get_by_id(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    if !post.published && claims.is_none() {
        // Drafts do not exist for the public.
        return Err(ApiError::NotFound);
    }
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    OptionalAdmin(claims): OptionalAdmin,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = Post::get_by_slug(&state.db, &slug)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !post.published && claims.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(post))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if payload.title.is_empty() || payload.slug.is_empty() {
        return Err(ApiError::Validation(
            "Title and slug are required".to_string(),
        ));
    }

    let post = Post::create(
        &state.db,
        NewPost {
            title: &payload.title,
            slug: &payload.slug,
            excerpt: &payload.excerpt,
            content: &payload.content,
            author_id: claims.user_id,
            published: payload.published,
            cover_image: payload.cover_image.as_deref(),
        },
    )
    .await?;

    info!(post_id = post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, patch))]
pub async fn update_post(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>, ApiError> {
    let post = Post::update(&state.db, id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(post_id = post.id, "post updated");
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !Post::delete(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    info!(post_id = id, "post deleted");
    Ok(Json(DeleteResponse { success: true }))
}
