use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use jetway_core::repository::UserRepository;
use jetway_core::user::normalize_email;
use jetway_core::{Role, StoreError, StoreResult, User};

use crate::database::{backend, unique_as};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone_number: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|e: String| StoreError::Backend(e.into()))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            role,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let email = normalize_email(&user.email);
        sqlx::query(
            "INSERT INTO users (id, name, email, phone_number, role, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&email)
        .bind(&user.phone_number)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(unique_as(&email))?;

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, phone_number, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, phone_number, role, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), phone_number = COALESCE($3, phone_number)
            WHERE id = $1
            RETURNING id, name, email, phone_number, role, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(User::try_from).transpose()
    }
}
