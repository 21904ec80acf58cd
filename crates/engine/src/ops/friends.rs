use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, Friend, ResultEngine, friends};

use super::{Engine, Page, normalize_optional_text, normalize_required_text, validate_page, with_tx};

impl Engine {
    pub async fn create_friend(
        &self,
        owner_id: Uuid,
        name: &str,
        notes: Option<&str>,
    ) -> ResultEngine<Friend> {
        let name = normalize_required_text(name, "friend name")?;
        let notes = normalize_optional_text(notes);

        with_tx!(self, |db_tx| {
            let model = friends::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id),
                name: ActiveValue::Set(name),
                notes: ActiveValue::Set(notes),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = model.insert(&db_tx).await?;
            Ok(Friend::from(model))
        })
    }

    pub async fn friend(&self, owner_id: Uuid, friend_id: Uuid) -> ResultEngine<Friend> {
        let model = friends::Entity::find_by_id(friend_id)
            .filter(friends::Column::OwnerId.eq(owner_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("friend".to_string()))?;
        Ok(Friend::from(model))
    }

    /// Newest first, optionally filtered by a name substring.
    pub async fn list_friends(
        &self,
        owner_id: Uuid,
        name: Option<&str>,
        page: u64,
        limit: u64,
    ) -> ResultEngine<Page<Friend>> {
        validate_page(page, limit)?;

        let mut query = friends::Entity::find()
            .filter(friends::Column::OwnerId.eq(owner_id))
            .order_by_desc(friends::Column::CreatedAt);
        if let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(friends::Column::Name.contains(name));
        }

        let paginator = query.paginate(&self.database, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            items: models.into_iter().map(Friend::from).collect(),
            total,
            page,
            limit,
        })
    }

    /// Partial update; `notes: Some(None)` clears the notes.
    pub async fn update_friend(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
        name: Option<&str>,
        notes: Option<Option<&str>>,
    ) -> ResultEngine<Friend> {
        let name = name
            .map(|value| normalize_required_text(value, "friend name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = friends::Entity::find_by_id(friend_id)
                .filter(friends::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("friend".to_string()))?;

            let mut active: friends::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(notes) = notes {
                active.notes = ActiveValue::Set(notes.and_then(|v| normalize_optional_text(Some(v))));
            }
            let model = active.update(&db_tx).await?;
            Ok(Friend::from(model))
        })
    }

    pub async fn delete_friend(&self, owner_id: Uuid, friend_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = friends::Entity::find_by_id(friend_id)
                .filter(friends::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("friend".to_string()))?;
            friends::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
