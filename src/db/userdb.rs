// src/db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::usermodel::{NewUser, User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, Error>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, Error>;

    async fn save_user(&self, user: NewUser) -> Result<User, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = $1
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE username = $1
            "#
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE role = $1
            ORDER BY full_name ASC, id ASC
            "#
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, full_name, role, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(user.username)
        .bind(user.password)
        .bind(user.full_name)
        .bind(user.role)
        .bind(user.email)
        .bind(user.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
