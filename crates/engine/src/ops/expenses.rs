use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    ComputedShare, EngineError, Expense, ExpenseCreateCmd, ExpenseUpdateCmd, FriendAccess,
    MoneyCents, ParticipantRef, ParticipantResolver, ResultEngine, SplitStrategy, categories,
    expense_splits, expenses, friends, groups, split, users,
};

use super::{
    DEFAULT_CURRENCY, Engine, Page, normalize_required_text, validate_currency, validate_page,
    with_tx,
};

/// Filters for listing expenses. Date bounds are inclusive.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    /// Case-sensitive substring match on the description.
    pub search: Option<String>,
}

/// Resolves split participants against the open transaction, scoped to the
/// requesting owner.
struct TxParticipantResolver<'a> {
    db_tx: &'a DatabaseTransaction,
    owner_id: Uuid,
}

impl ParticipantResolver for TxParticipantResolver<'_> {
    async fn user_exists(&self, user_id: Uuid) -> ResultEngine<bool> {
        Ok(users::Entity::find_by_id(user_id)
            .one(self.db_tx)
            .await?
            .is_some())
    }

    async fn friend_access(&self, friend_id: Uuid) -> ResultEngine<FriendAccess> {
        match friends::Entity::find_by_id(friend_id).one(self.db_tx).await? {
            Some(model) => Ok(FriendAccess {
                exists: true,
                owned_by_caller: model.owner_id == self.owner_id,
            }),
            None => Ok(FriendAccess {
                exists: false,
                owned_by_caller: false,
            }),
        }
    }
}

impl Engine {
    /// Create an expense together with its computed split shares, atomically.
    pub async fn create_expense(&self, cmd: ExpenseCreateCmd) -> ResultEngine<Expense> {
        let description = normalize_required_text(&cmd.description, "expense description")?;
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        let currency = validate_currency(cmd.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))?;
        let total = MoneyCents::new(cmd.amount_minor);

        with_tx!(self, |db_tx| {
            self.require_owned_category(&db_tx, cmd.owner_id, cmd.category_id)
                .await?;
            self.require_owned_group(&db_tx, cmd.owner_id, cmd.group_id)
                .await?;

            let resolver = TxParticipantResolver {
                db_tx: &db_tx,
                owner_id: cmd.owner_id,
            };
            let shares =
                split::compute_splits(total, cmd.strategy, &cmd.lines, &resolver).await?;

            let created_at = Utc::now();
            let expense_model = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(cmd.owner_id),
                description: ActiveValue::Set(description),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                currency: ActiveValue::Set(currency),
                date: ActiveValue::Set(cmd.date),
                category_id: ActiveValue::Set(cmd.category_id),
                group_id: ActiveValue::Set(cmd.group_id),
                split_strategy: ActiveValue::Set(cmd.strategy.as_str().to_string()),
                created_at: ActiveValue::Set(created_at),
            };
            let expense_model = expense_model.insert(&db_tx).await?;

            let split_models =
                insert_shares(&db_tx, expense_model.id, &shares).await?;
            Expense::from_models(expense_model, split_models)
        })
    }

    /// Return an expense with its shares.
    pub async fn expense(&self, owner_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = require_owned_expense(&db_tx, owner_id, expense_id).await?;
            let split_models = model
                .find_related(expense_splits::Entity)
                .order_by_asc(expense_splits::Column::Position)
                .all(&db_tx)
                .await?;
            Expense::from_models(model, split_models)
        })
    }

    /// List expenses newest date first, with page/limit pagination.
    pub async fn list_expenses(
        &self,
        owner_id: Uuid,
        filter: &ExpenseListFilter,
        page: u64,
        limit: u64,
    ) -> ResultEngine<Page<Expense>> {
        validate_page(page, limit)?;
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(EngineError::InvalidAmount(
                "invalid range: date_from must be <= date_to".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let mut query = expenses::Entity::find()
                .filter(expenses::Column::OwnerId.eq(owner_id))
                .order_by_desc(expenses::Column::Date)
                .order_by_desc(expenses::Column::CreatedAt);
            if let Some(from) = filter.date_from {
                query = query.filter(expenses::Column::Date.gte(from));
            }
            if let Some(to) = filter.date_to {
                query = query.filter(expenses::Column::Date.lte(to));
            }
            if let Some(category_id) = filter.category_id {
                query = query.filter(expenses::Column::CategoryId.eq(category_id));
            }
            if let Some(group_id) = filter.group_id {
                query = query.filter(expenses::Column::GroupId.eq(group_id));
            }
            if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
            {
                query = query.filter(expenses::Column::Description.contains(search));
            }

            let paginator = query.paginate(&db_tx, limit);
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page - 1).await?;

            let mut items = Vec::with_capacity(models.len());
            for model in models {
                let split_models = model
                    .find_related(expense_splits::Entity)
                    .order_by_asc(expense_splits::Column::Position)
                    .all(&db_tx)
                    .await?;
                items.push(Expense::from_models(model, split_models)?);
            }

            Ok(Page {
                items,
                total,
                page,
                limit,
            })
        })
    }

    /// Partially update an expense.
    ///
    /// When `cmd.lines` is present the split engine runs against the
    /// effective amount and strategy, and the persisted shares are replaced
    /// wholesale inside the same transaction. Scalar-only updates leave the
    /// stored shares untouched.
    pub async fn update_expense(&self, cmd: ExpenseUpdateCmd) -> ResultEngine<Expense> {
        let description = cmd
            .description
            .as_deref()
            .map(|value| normalize_required_text(value, "expense description"))
            .transpose()?;
        if let Some(amount_minor) = cmd.amount_minor
            && amount_minor <= 0
        {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        let currency = cmd
            .currency
            .as_deref()
            .map(validate_currency)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = require_owned_expense(&db_tx, cmd.owner_id, cmd.expense_id).await?;

            let effective_amount = cmd.amount_minor.unwrap_or(model.amount_minor);
            let effective_strategy = match cmd.strategy {
                Some(strategy) => strategy,
                None => SplitStrategy::try_from(model.split_strategy.as_str())?,
            };
            let effective_category = cmd.category_id.unwrap_or(model.category_id);
            let effective_group = cmd.group_id.unwrap_or(model.group_id);
            self.require_owned_category(&db_tx, cmd.owner_id, effective_category)
                .await?;
            self.require_owned_group(&db_tx, cmd.owner_id, effective_group)
                .await?;

            let expense_id = model.id;
            let mut active: expenses::ActiveModel = model.into();
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(amount_minor) = cmd.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(currency) = currency {
                active.currency = ActiveValue::Set(currency);
            }
            if let Some(date) = cmd.date {
                active.date = ActiveValue::Set(date);
            }
            if cmd.category_id.is_some() {
                active.category_id = ActiveValue::Set(effective_category);
            }
            if cmd.group_id.is_some() {
                active.group_id = ActiveValue::Set(effective_group);
            }
            if let Some(strategy) = cmd.strategy {
                active.split_strategy = ActiveValue::Set(strategy.as_str().to_string());
            }
            let model = active.update(&db_tx).await?;

            let split_models = if let Some(lines) = &cmd.lines {
                let resolver = TxParticipantResolver {
                    db_tx: &db_tx,
                    owner_id: cmd.owner_id,
                };
                let shares = split::compute_splits(
                    MoneyCents::new(effective_amount),
                    effective_strategy,
                    lines,
                    &resolver,
                )
                .await?;

                // Prior shares are discarded entirely; partial-share mutation
                // is not a thing.
                expense_splits::Entity::delete_many()
                    .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                    .exec(&db_tx)
                    .await?;
                insert_shares(&db_tx, expense_id, &shares).await?
            } else {
                model
                    .find_related(expense_splits::Entity)
                    .order_by_asc(expense_splits::Column::Position)
                    .all(&db_tx)
                    .await?
            };

            Expense::from_models(model, split_models)
        })
    }

    /// Delete an expense and its shares.
    pub async fn delete_expense(&self, owner_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = require_owned_expense(&db_tx, owner_id, expense_id).await?;
            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(model.id))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn require_owned_category(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: Uuid,
        category_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        if categories::Entity::find_by_id(category_id)
            .filter(categories::Column::OwnerId.eq(owner_id))
            .one(db_tx)
            .await?
            .is_none()
        {
            return Err(EngineError::InvalidReference(
                "invalid category_id".to_string(),
            ));
        }
        Ok(())
    }

    async fn require_owned_group(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: Uuid,
        group_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let Some(group_id) = group_id else {
            return Ok(());
        };
        if groups::Entity::find_by_id(group_id)
            .filter(groups::Column::OwnerId.eq(owner_id))
            .one(db_tx)
            .await?
            .is_none()
        {
            return Err(EngineError::InvalidReference(
                "invalid group_id".to_string(),
            ));
        }
        Ok(())
    }
}

async fn require_owned_expense(
    db_tx: &DatabaseTransaction,
    owner_id: Uuid,
    expense_id: Uuid,
) -> ResultEngine<expenses::Model> {
    expenses::Entity::find_by_id(expense_id)
        .filter(expenses::Column::OwnerId.eq(owner_id))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))
}

/// Persist computed shares in input order; `position` records that order.
async fn insert_shares(
    db_tx: &DatabaseTransaction,
    expense_id: Uuid,
    shares: &[ComputedShare],
) -> ResultEngine<Vec<expense_splits::Model>> {
    let created_at = Utc::now();
    let mut models = Vec::with_capacity(shares.len());
    for (position, share) in shares.iter().enumerate() {
        let (user_id, friend_id) = match share.participant {
            ParticipantRef::User(id) => (Some(id), None),
            ParticipantRef::Friend(id) => (None, Some(id)),
        };
        let model = expense_splits::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            expense_id: ActiveValue::Set(expense_id),
            position: ActiveValue::Set(position as i32),
            participant_kind: ActiveValue::Set(share.participant.kind().as_str().to_string()),
            participant_user_id: ActiveValue::Set(user_id),
            participant_friend_id: ActiveValue::Set(friend_id),
            amount_minor: ActiveValue::Set(share.amount.cents()),
            percent_e4: ActiveValue::Set(share.percent.map(|p| p.e4())),
            created_at: ActiveValue::Set(created_at),
        };
        models.push(model.insert(db_tx).await?);
    }
    Ok(models)
}
