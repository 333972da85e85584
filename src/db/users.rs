//! Database queries for user accounts.

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};

use crate::entity::user::{self as user, ActiveModel, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, ProfileUpdate, User};

use super::DbPool;

impl DbPool {
    /// Insert a new account. `password_hash` is the encoded Argon2 hash.
    ///
    /// Returns `InvalidInput` when the username is already taken.
    pub async fn create_user(&self, new_user: &NewUser, password_hash: &str) -> AppResult<User> {
        let model = ActiveModel {
            username: Set(new_user.username.clone()),
            email: Set(new_user.email.clone()),
            first_name: Set(new_user.first_name.clone()),
            last_name: Set(new_user.last_name.clone()),
            password_hash: Set(password_hash.to_string()),
            avatar: Set(None),
            bio: Set(None),
            is_staff: Set(false),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            ..Default::default()
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
                AppError::InvalidInput("A user with that username already exists.".to_string())
            } else {
                AppError::Database(format!("Failed to insert user: {}", e))
            }
        })?;

        Ok(result.into())
    }

    /// Get a user by ID.
    pub async fn get_user_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?;

        Ok(result.map(User::from))
    }

    /// Get a user by exact username.
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.find_user_model(username).await?.map(User::from))
    }

    /// Username and password hash, for credential checks.
    pub async fn get_credentials(&self, username: &str) -> AppResult<Option<(User, String)>> {
        Ok(self.find_user_model(username).await?.map(|m| {
            let hash = m.password_hash.clone();
            (User::from(m), hash)
        }))
    }

    async fn find_user_model(&self, username: &str) -> AppResult<Option<user::Model>> {
        UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))
    }

    /// Whether a username is taken, ignoring case.
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .eq(username.to_lowercase()),
            )
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check username: {}", e)))?;

        Ok(count > 0)
    }

    /// Apply a validated profile update.
    pub async fn update_profile(&self, id: i32, update: &ProfileUpdate) -> AppResult<User> {
        let mut active: ActiveModel = self.user_model(id).await?.into();
        active.email = Set(update.email.clone());
        active.first_name = Set(update.first_name.clone());
        active.last_name = Set(update.last_name.clone());
        active.bio = Set(update.bio.clone());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update profile: {}", e)))?;

        Ok(result.into())
    }

    /// Replace (or clear) the stored avatar path. Returns the previous path.
    pub async fn set_avatar(&self, id: i32, avatar: Option<String>) -> AppResult<Option<String>> {
        let model = self.user_model(id).await?;
        let previous = model.avatar.clone();
        let mut active: ActiveModel = model.into();
        active.avatar = Set(avatar);

        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update avatar: {}", e)))?;

        Ok(previous)
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        let mut active: ActiveModel = self.user_model(id).await?.into();
        active.last_login = Set(Some(Utc::now()));
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;
        Ok(())
    }

    async fn user_model(&self, id: i32) -> AppResult<user::Model> {
        UserEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
    }
}
