use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db_persistence::DbError,
    models::user::{User, UserProfileUpdate},
    repositories::DbResult,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<User>>;
    async fn find_by_telegram_id(&self, telegram_id: &str) -> DbResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>>;
    async fn create(&self, new_user: &User) -> DbResult<User>;
    async fn update_profile(&self, id: &Uuid, profile: &UserProfileUpdate) -> DbResult<User>;
}

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: PgPool,
}
impl UserRepository {
    fn create_select_base_query<'a>() -> QueryBuilder<'a, Postgres> {
        QueryBuilder::new("SELECT * FROM users")
    }

    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> DbResult<Option<User>> {
        let mut qb = UserRepository::create_select_base_query();
        qb.push(" WHERE id = ");
        qb.push_bind(*id);

        let user = qb.build_query_as().fetch_optional(&self.pool).await?;

        Ok(user)
    }

    async fn find_by_telegram_id(&self, telegram_id: &str) -> DbResult<Option<User>> {
        let mut qb = UserRepository::create_select_base_query();
        qb.push(" WHERE telegram_id = ");
        qb.push_bind(telegram_id);

        let user = qb.build_query_as().fetch_optional(&self.pool).await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut qb = UserRepository::create_select_base_query();
        qb.push(" WHERE username = ");
        qb.push_bind(username);
        qb.push(" ORDER BY created_at LIMIT 1");

        let user = qb.build_query_as().fetch_optional(&self.pool).await?;

        Ok(user)
    }

    async fn create(&self, new_user: &User) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            "
            INSERT INTO users (
                id, telegram_id, first_name, last_name, username, role, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            ",
        )
        .bind(new_user.id)
        .bind(&new_user.telegram_id)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(new_user.role.to_string())
        .bind(new_user.is_active)
        .bind(new_user.created_at)
        .bind(new_user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(&self, id: &Uuid, profile: &UserProfileUpdate) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            "
            UPDATE users
            SET first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                username = COALESCE($3, username),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            ",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| DbError::RecordNotFound(format!("User {} not found", id)))
    }
}
