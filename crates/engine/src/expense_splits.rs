//! Expense splits table: one row per participant share of one expense.
//!
//! Rows are replaced wholesale whenever the parent expense's split changes;
//! `position` preserves the input line order so the "last participant absorbs
//! the residual" rule stays visible in reads.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ParticipantKind, ParticipantRef, Percent};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub position: i32,
    pub participant_kind: String,
    pub participant_user_id: Option<Uuid>,
    pub participant_friend_id: Option<Uuid>,
    pub amount_minor: i64,
    pub percent_e4: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expense,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One participant's persisted share.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseShare {
    pub id: Uuid,
    pub participant: ParticipantRef,
    pub amount: MoneyCents,
    pub percent: Option<Percent>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Model> for ExpenseShare {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = ParticipantKind::try_from(model.participant_kind.as_str())?;
        let participant = match (kind, model.participant_user_id, model.participant_friend_id)
        {
            (ParticipantKind::User, Some(id), None) => ParticipantRef::User(id),
            (ParticipantKind::Friend, None, Some(id)) => ParticipantRef::Friend(id),
            _ => {
                return Err(EngineError::InvalidId(format!(
                    "corrupted split row {}",
                    model.id
                )));
            }
        };

        Ok(Self {
            id: model.id,
            participant,
            amount: MoneyCents::new(model.amount_minor),
            percent: model.percent_e4.map(Percent::from_e4),
            created_at: model.created_at,
        })
    }
}
