use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories};

use super::{Engine, Page, normalize_optional_text, normalize_required_text, validate_page, with_tx};

impl Engine {
    /// Category names are unique per owner.
    pub async fn create_category(
        &self,
        owner_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_text(name, "category name")?;
        let color = normalize_optional_text(color);

        with_tx!(self, |db_tx| {
            self.require_free_category_name(&db_tx, owner_id, &name, None)
                .await?;

            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                owner_id: ActiveValue::Set(owner_id),
                name: ActiveValue::Set(name),
                color: ActiveValue::Set(color),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = model.insert(&db_tx).await?;
            Ok(Category::from(model))
        })
    }

    pub async fn category(&self, owner_id: Uuid, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::OwnerId.eq(owner_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
        Ok(Category::from(model))
    }

    /// Newest first, optionally filtered by a name substring.
    pub async fn list_categories(
        &self,
        owner_id: Uuid,
        name: Option<&str>,
        page: u64,
        limit: u64,
    ) -> ResultEngine<Page<Category>> {
        validate_page(page, limit)?;

        let mut query = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id))
            .order_by_desc(categories::Column::CreatedAt);
        if let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(categories::Column::Name.contains(name));
        }

        let paginator = query.paginate(&self.database, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok(Page {
            items: models.into_iter().map(Category::from).collect(),
            total,
            page,
            limit,
        })
    }

    /// Partial update; `color: Some(None)` clears the color. Renames keep the
    /// per-owner uniqueness.
    pub async fn update_category(
        &self,
        owner_id: Uuid,
        category_id: Uuid,
        name: Option<&str>,
        color: Option<Option<&str>>,
    ) -> ResultEngine<Category> {
        let name = name
            .map(|value| normalize_required_text(value, "category name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = categories::Entity::find_by_id(category_id)
                .filter(categories::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;

            if let Some(name) = &name
                && *name != model.name
            {
                self.require_free_category_name(&db_tx, owner_id, name, Some(category_id))
                    .await?;
            }

            let mut active: categories::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color.and_then(|v| normalize_optional_text(Some(v))));
            }
            let model = active.update(&db_tx).await?;
            Ok(Category::from(model))
        })
    }

    pub async fn delete_category(&self, owner_id: Uuid, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = categories::Entity::find_by_id(category_id)
                .filter(categories::Column::OwnerId.eq(owner_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
            categories::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    async fn require_free_category_name(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: Uuid,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(format!("category {name}")));
        }
        Ok(())
    }
}
