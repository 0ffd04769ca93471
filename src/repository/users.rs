//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::UserStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateUser, UserRow},
        User,
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, password, first_name, last_name, permissions, created_at";

#[async_trait]
impl UserStore for UsersRepository {
    async fn get(&self, id: i32) -> AppResult<User> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create(&self, user: &CreateUser) -> AppResult<User> {
        let permissions: Vec<String> = user
            .permissions
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();

        let query = format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&permissions)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_db(e, "User"))?;

        Ok(row.into())
    }
}
