use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{prelude::*, users};
use motus_types::User;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_user(model: users::Model) -> User {
        User {
            user_id: model.user_id,
            nickname: model.nickname,
            seed: model.seed as u64,
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let user_model = Users::find_by_id(user_id.to_string()).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn create_user(&self, user_id: &str, nickname: &str, seed: u64) -> Result<User> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();

        let user_model = users::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id.to_string()),
            nickname: sea_orm::ActiveValue::Set(nickname.to_string()),
            seed: sea_orm::ActiveValue::Set(seed as i64),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
        };

        Users::insert(user_model).exec(&self.db).await?;

        // Fetch the created user
        let created_user = Users::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))?;

        Ok(Self::model_to_user(created_user))
    }

    pub async fn get_seed(&self, user_id: &str) -> Result<Option<u64>> {
        let seed: Option<i64> = Users::find_by_id(user_id.to_string())
            .select_only()
            .column(users::Column::Seed)
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(seed.map(|seed| seed as u64))
    }

    pub async fn get_nickname(&self, user_id: &str) -> Result<Option<String>> {
        let nickname: Option<String> = Users::find_by_id(user_id.to_string())
            .select_only()
            .column(users::Column::Nickname)
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(nickname)
    }

    /// Store a new seed. Returns false when no such user exists.
    pub async fn set_seed(&self, user_id: &str, seed: u64) -> Result<bool> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();

        let result = Users::update_many()
            .col_expr(users::Column::Seed, Expr::value(seed as i64))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
