//! Groups API endpoints.

use api_types::common::PageMeta;
use api_types::group::{GroupListQuery, GroupListResponse, GroupNew, GroupUpdate, GroupView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn view(group: engine::Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        description: group.description,
        created_at: group.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(user.id, &payload.name, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(view(group))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<GroupListQuery>,
) -> Result<Json<GroupListResponse>, ServerError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let result = state
        .engine
        .list_groups(user.id, query.name.as_deref(), page, limit)
        .await?;

    Ok(Json(GroupListResponse {
        groups: result.items.into_iter().map(view).collect(),
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
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(user.id, id).await?;
    Ok(Json(view(group)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .update_group(
            user.id,
            id,
            payload.name.as_deref(),
            payload.description.as_ref().map(Option::as_deref),
        )
        .await?;
    Ok(Json(view(group)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
