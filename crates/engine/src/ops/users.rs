use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, users};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Provision a user account (admin surface; there is no self-service
    /// registration).
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> ResultEngine<User> {
        let email = normalize_required_text(email, "user email")?.to_lowercase();
        let name = normalize_required_text(name, "user name")?;
        if password.is_empty() {
            return Err(EngineError::InvalidName(
                "user password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(format!("user {email}")));
            }

            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                email: ActiveValue::Set(email),
                name: ActiveValue::Set(name),
                password: ActiveValue::Set(password.to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = model.insert(&db_tx).await?;
            Ok(User::from(model))
        })
    }

    /// All user accounts, oldest first (admin surface).
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }
}
