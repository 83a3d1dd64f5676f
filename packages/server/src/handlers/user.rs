use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use foodgram_common::{relation, users};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::Pagination;
use crate::models::user::{
    SubscribeQuery, SubscriptionListQuery, SubscriptionListResponse, SubscriptionResponse,
    UserResponse,
};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 6;
const MAX_PAGE_SIZE: u64 = 100;

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Returns every user ordered by id. `is_subscribed` is relative to the caller \
        and always false for anonymous requests.",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_users(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::actor);
    let cards = users::list(&*state.store, viewer.as_ref()).await?;
    Ok(Json(cards.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Token refers to a deleted user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let actor = auth_user.actor();
    let card = users::get(&*state.store, Some(&actor), actor.user_id).await?;
    Ok(Json(card.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(user_id = id))]
pub async fn get_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let viewer = auth_user.as_ref().map(AuthUser::actor);
    let card = users::get(&*state.store, viewer.as_ref(), id).await?;
    Ok(Json(card.into()))
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "Users",
    operation_id = "listSubscriptions",
    summary = "List followed authors",
    description = "Returns the authors the caller follows, most recent subscription first, each \
        with their latest recipes. `limit` defaults to 6 and may not exceed 100.",
    params(SubscriptionListQuery),
    responses(
        (status = 200, description = "Followed authors", body = SubscriptionListResponse),
        (status = 400, description = "Invalid paging or recipes_limit (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_subscriptions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::invalid_field("page", "page must be at least 1"));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::invalid_field(
            "limit",
            format!("limit must be 1-{MAX_PAGE_SIZE}"),
        ));
    }

    let offset = (page - 1)
        .checked_mul(limit)
        .filter(|&offset| i64::try_from(offset).is_ok())
        .ok_or_else(|| AppError::invalid_field("page", "page is out of range"))?;

    let (feeds, total) = users::subscriptions(
        &*state.store,
        &auth_user.actor(),
        offset,
        limit,
        query.recipes_limit,
    )
    .await?;

    let storage = &state.config.storage;
    Ok(Json(SubscriptionListResponse {
        data: feeds
            .into_iter()
            .map(|feed| SubscriptionResponse::from_feed(feed, storage))
            .collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/subscribe",
    tag = "Users",
    operation_id = "subscribe",
    summary = "Follow an author",
    params(
        ("id" = i32, Path, description = "Author user ID"),
        SubscribeQuery,
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription or recipes_limit above 1000 (VALIDATION_ERROR), or already subscribed (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(author_id = id))]
pub async fn subscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<SubscribeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let feed = relation::subscribe(&*state.store, &auth_user.actor(), id, query.recipes_limit)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from_feed(feed, &state.config.storage)),
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/subscribe",
    tag = "Users",
    operation_id = "unsubscribe",
    summary = "Unfollow an author",
    params(("id" = i32, Path, description = "Author user ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(author_id = id))]
pub async fn unsubscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    relation::unsubscribe(&*state.store, &auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
