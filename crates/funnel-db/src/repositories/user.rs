//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use funnel_core::{
    DomainError, NewUser, RepoResult, User, UserField, UserId, UserRepository, UserStats,
};

use crate::models::{UserModel, UserStatsModel};

use super::error::{map_db_error, map_unique_violation, user_conflict, user_not_found};

const USER_COLUMNS: &str = r"
    user_id, name, email, phone, country, language, referral_code, referred_by,
    telegram_username, privacy_allowed, is_active, joined_at
";

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter} = $1");
        sqlx::query_as::<_, UserModel>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, UserModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", &email.to_lowercase()).await
    }

    #[instrument(skip(self))]
    async fn find_by_referral_code(&self, code: &str) -> RepoResult<Option<User>> {
        self.find_one("referral_code", code).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        let sql = format!(
            r"
            INSERT INTO users (user_id, name, email, phone, country, language, referral_code,
                               referred_by, telegram_username, privacy_allowed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "
        );
        let model = sqlx::query_as::<_, UserModel>(&sql)
            .bind(user.id.into_inner())
            .bind(&user.name)
            .bind(user.email.as_deref().map(str::to_lowercase))
            .bind(&user.phone)
            .bind(&user.country)
            .bind(user.language.code())
            .bind(&user.referral_code)
            .bind(user.referred_by.map(UserId::into_inner))
            .bind(&user.telegram_username)
            .bind(user.privacy_allowed)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |constraint| user_conflict(user.id, constraint)))?;

        User::try_from(model)
    }

    #[instrument(skip(self))]
    async fn update_field(&self, id: UserId, field: &UserField) -> RepoResult<()> {
        let sql = format!("UPDATE users SET {} = $2 WHERE user_id = $1", field.column());
        let query = sqlx::query(&sql).bind(id.into_inner());
        let query = match field {
            UserField::Name(v) | UserField::Phone(v) | UserField::Country(v) => query.bind(v.clone()),
            UserField::Email(v) => query.bind(v.as_deref().map(str::to_lowercase)),
            UserField::TelegramUsername(v) => query.bind(v.clone()),
            UserField::Language(v) => query.bind(v.code()),
            UserField::Active(v) => query.bind(*v),
        };

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, |_| DomainError::EmailAlreadyExists))?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, active_only: bool, limit: Option<i64>) -> RepoResult<Vec<User>> {
        let sql = format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1 = FALSE OR is_active)
            ORDER BY joined_at DESC, user_id DESC
            LIMIT $2
            "
        );
        sqlx::query_as::<_, UserModel>(&sql)
            .bind(active_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    #[instrument(skip(self))]
    async fn stats(&self, since: DateTime<Utc>) -> RepoResult<UserStats> {
        let model = sqlx::query_as::<_, UserStatsModel>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE joined_at > $1) AS new_this_week,
                   COUNT(*) FILTER (WHERE is_active) AS active
            FROM users
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(UserStats::from(model))
    }
}
