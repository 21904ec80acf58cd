//! Expenses table and the assembled expense snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{
    EngineError, ExpenseShare, MoneyCents, ResultEngine, SplitStrategy, expense_splits,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub date: Date,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub split_strategy: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Group,
    #[sea_orm(has_many = "super::expense_splits::Entity")]
    Splits,
}

impl Related<super::expense_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// An expense with its persisted split shares, in split order.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub amount: MoneyCents,
    pub currency: String,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub strategy: SplitStrategy,
    pub created_at: DateTime<Utc>,
    pub shares: Vec<ExpenseShare>,
}

impl Expense {
    /// Assembles the snapshot from the stored rows, ordering shares by their
    /// stored position.
    pub(crate) fn from_models(
        model: Model,
        mut split_models: Vec<expense_splits::Model>,
    ) -> ResultEngine<Self> {
        split_models.sort_by_key(|share| share.position);
        let shares = split_models
            .into_iter()
            .map(ExpenseShare::try_from)
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            description: model.description,
            amount: MoneyCents::new(model.amount_minor),
            currency: model.currency,
            date: model.date,
            category_id: model.category_id,
            group_id: model.group_id,
            strategy: SplitStrategy::try_from(model.split_strategy.as_str())?,
            created_at: model.created_at,
            shares,
        })
    }
}
