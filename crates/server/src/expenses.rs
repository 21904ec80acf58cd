//! Expenses API endpoints.
//!
//! The split payload is forwarded to the engine as-is; all split validation
//! (participant resolution, sum checks, rounding) happens there.

use api_types::common::PageMeta;
use api_types::expense::{
    ExpenseListQuery, ExpenseListResponse, ExpenseNew, ExpenseUpdate, ExpenseView, ShareView,
    SplitLinePayload,
};
use api_types::{ParticipantKind as ApiKind, SplitStrategy as ApiStrategy};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_strategy(strategy: ApiStrategy) -> engine::SplitStrategy {
    match strategy {
        ApiStrategy::Amount => engine::SplitStrategy::Amount,
        ApiStrategy::Percentage => engine::SplitStrategy::Percentage,
    }
}

fn map_strategy_back(strategy: engine::SplitStrategy) -> ApiStrategy {
    match strategy {
        engine::SplitStrategy::Amount => ApiStrategy::Amount,
        engine::SplitStrategy::Percentage => ApiStrategy::Percentage,
    }
}

fn map_line(payload: &SplitLinePayload) -> engine::SplitLine {
    engine::SplitLine {
        kind: match payload.participant_kind {
            ApiKind::User => engine::ParticipantKind::User,
            ApiKind::Friend => engine::ParticipantKind::Friend,
        },
        user_id: payload.user_id,
        friend_id: payload.friend_id,
        amount: payload.amount_minor.map(engine::MoneyCents::new),
        percent: payload.percent_e4.map(engine::Percent::from_e4),
    }
}

fn share_view(share: engine::ExpenseShare) -> ShareView {
    let (kind, user_id, friend_id) = match share.participant {
        engine::ParticipantRef::User(id) => (ApiKind::User, Some(id), None),
        engine::ParticipantRef::Friend(id) => (ApiKind::Friend, None, Some(id)),
    };
    ShareView {
        id: share.id,
        participant_kind: kind,
        user_id,
        friend_id,
        amount_minor: share.amount.cents(),
        percent_e4: share.percent.map(|p| p.e4()),
        created_at: share.created_at,
    }
}

fn view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        owner_id: expense.owner_id,
        description: expense.description,
        amount_minor: expense.amount.cents(),
        currency: expense.currency,
        date: expense.date,
        category_id: expense.category_id,
        group_id: expense.group_id,
        split_strategy: map_strategy_back(expense.strategy),
        created_at: expense.created_at,
        splits: expense.shares.into_iter().map(share_view).collect(),
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let cmd = engine::ExpenseCreateCmd {
        owner_id: user.id,
        description: payload.description,
        amount_minor: payload.amount_minor,
        currency: payload.currency,
        date: payload.date.unwrap_or_else(|| Utc::now().date_naive()),
        category_id: payload.category_id,
        group_id: payload.group_id,
        strategy: map_strategy(payload.split_strategy),
        lines: payload.splits.iter().map(map_line).collect(),
    };

    let expense = state.engine.create_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(expense))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);
    let filter = engine::ExpenseListFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        category_id: query.category_id,
        group_id: query.group_id,
        search: query.q,
    };

    let result = state
        .engine
        .list_expenses(user.id, &filter, page, limit)
        .await?;

    Ok(Json(ExpenseListResponse {
        expenses: result.items.into_iter().map(view).collect(),
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
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(user.id, id).await?;
    Ok(Json(view(expense)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let cmd = engine::ExpenseUpdateCmd {
        owner_id: user.id,
        expense_id: id,
        description: payload.description,
        amount_minor: payload.amount_minor,
        currency: payload.currency,
        date: payload.date,
        category_id: payload.category_id,
        group_id: payload.group_id,
        strategy: payload.split_strategy.map(map_strategy),
        lines: payload
            .splits
            .map(|splits| splits.iter().map(map_line).collect()),
    };

    let expense = state.engine.update_expense(cmd).await?;
    Ok(Json(view(expense)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
