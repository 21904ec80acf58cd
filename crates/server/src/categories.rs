//! Categories API endpoints.

use api_types::category::{
    CategoryListQuery, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use api_types::common::PageMeta;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        color: category.color,
        created_at: category.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(user.id, &payload.name, payload.color.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(view(category))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let result = state
        .engine
        .list_categories(user.id, query.name.as_deref(), page, limit)
        .await?;

    Ok(Json(CategoryListResponse {
        categories: result.items.into_iter().map(view).collect(),
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
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(user.id, id).await?;
    Ok(Json(view(category)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(
            user.id,
            id,
            payload.name.as_deref(),
            payload.color.as_ref().map(Option::as_deref),
        )
        .await?;
    Ok(Json(view(category)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
