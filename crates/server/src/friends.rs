//! Friends API endpoints.

use api_types::friend::{FriendListQuery, FriendListResponse, FriendNew, FriendUpdate, FriendView};
use api_types::common::PageMeta;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn view(friend: engine::Friend) -> FriendView {
    FriendView {
        id: friend.id,
        name: friend.name,
        notes: friend.notes,
        created_at: friend.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FriendNew>,
) -> Result<(StatusCode, Json<FriendView>), ServerError> {
    let friend = state
        .engine
        .create_friend(user.id, &payload.name, payload.notes.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(view(friend))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<FriendListQuery>,
) -> Result<Json<FriendListResponse>, ServerError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let result = state
        .engine
        .list_friends(user.id, query.name.as_deref(), page, limit)
        .await?;

    Ok(Json(FriendListResponse {
        friends: result.items.into_iter().map(view).collect(),
        meta: PageMeta {
            total: result.total,
            page: result.page,
            limit: result.limit,
        },
    }))
}

pub async fn get_one(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FriendView>, ServerError> {
    let friend = state.engine.friend(user.id, id).await?;
    Ok(Json(view(friend)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FriendUpdate>,
) -> Result<Json<FriendView>, ServerError> {
    let friend = state
        .engine
        .update_friend(
            user.id,
            id,
            payload.name.as_deref(),
            payload.notes.as_ref().map(Option::as_deref),
        )
        .await?;
    Ok(Json(view(friend)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_friend(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
