use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, Group, ResultEngine, groups};

use super::{Engine, Page, normalize_optional_text, normalize_required_text, validate_page, with_tx};

impl Engine {
    /// Group names are unique per owner.
    pub async fn create_group(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> ResultEngine<Group> {
        let name = normalize_required_text(name, "group name")?;
        let description = normalize_optional_text(description);

        with_tx!(self, |db_tx| {
            self.require_free_group_name(&db_tx, owner_id, &name, None)
                .await?;

            let model = groups::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = model.insert(&db_tx).await?;
            Ok(Group::from(model))
        })
    }

    pub async fn group(&self, owner_id: Uuid, group_id: Uuid) -> ResultEngine<Group> {
        let model = groups::Entity::find_by_id(group_id)
            .filter(groups::Column::OwnerId.eq(owner_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group".to_string()))?;
        Ok(Group::from(model))
    }

    /// Newest first, optionally filtered by a name substring.
    pub async fn list_groups(
        &self,
        owner_id: Uuid,
        name: Option<&str>,
        page: u64,
        limit: u64,
    ) -> ResultEngine<Page<Group>> {
        validate_page(page, limit)?;

        let mut query = groups::Entity::find()
            .filter(groups::Column::OwnerId.eq(owner_id))
            .order_by_desc(groups::Column::CreatedAt);
        if let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(groups::Column::Name.contains(name));
        }

        let paginator = query.paginate(&self.database, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            items: models.into_iter().map(Group::from).collect(),
            total,
            page,
            limit,
        })
    }

    /// Partial update; `description: Some(None)` clears the description.
    pub async fn update_group(
        &self,
        owner_id: Uuid,
        group_id: Uuid,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> ResultEngine<Group> {
        let name = name
            .map(|value| normalize_required_text(value, "group name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = groups::Entity::find_by_id(group_id)
                .filter(groups::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("group".to_string()))?;

            if let Some(name) = &name
                && *name != model.name
            {
                self.require_free_group_name(&db_tx, owner_id, name, Some(group_id))
                    .await?;
            }

            let mut active: groups::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(description) = description {
                active.description =
                    ActiveValue::Set(description.and_then(|v| normalize_optional_text(Some(v))));
            }
            let model = active.update(&db_tx).await?;
            Ok(Group::from(model))
        })
    }

    pub async fn delete_group(&self, owner_id: Uuid, group_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = groups::Entity::find_by_id(group_id)
                .filter(groups::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("group".to_string()))?;
            groups::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn require_free_group_name(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: Uuid,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = groups::Entity::find()
            .filter(groups::Column::OwnerId.eq(owner_id))
            .filter(groups::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(groups::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(format!("group {name}")));
        }
        Ok(())
    }
}
