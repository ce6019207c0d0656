//! Postgres implementation of the user and franchise repositories.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Franchise, User};
use crate::ports::{FranchiseRepository, RepositoryResult, UserRepository};

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn insert(&self, user: &User) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, email, first_name, last_name, phone, role, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }
}

#[derive(Clone)]
pub struct PostgresFranchiseRepository {
    pool: PgPool,
}

impl PostgresFranchiseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FranchiseRepository for PostgresFranchiseRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Franchise>> {
        let row = sqlx::query_as::<_, FranchiseRow>("SELECT * FROM franchises WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(FranchiseRow::into_domain).transpose()
    }

    async fn insert(&self, franchise: &Franchise) -> RepositoryResult<Franchise> {
        let row = sqlx::query_as::<_, FranchiseRow>(
            r#"
            INSERT INTO franchises (
                id, name, business_owner_id, status, franchise_fee, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(franchise.id)
        .bind(&franchise.name)
        .bind(franchise.business_owner_id)
        .bind(franchise.status.as_str())
        .bind(&franchise.franchise_fee)
        .bind(franchise.created_at)
        .bind(franchise.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }
}

/// Internal row types for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> RepositoryResult<User> {
        Ok(User {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            role: self.role.parse()?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FranchiseRow {
    id: Uuid,
    name: String,
    business_owner_id: Uuid,
    status: String,
    franchise_fee: BigDecimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FranchiseRow {
    fn into_domain(self) -> RepositoryResult<Franchise> {
        Ok(Franchise {
            id: self.id,
            name: self.name,
            business_owner_id: self.business_owner_id,
            status: self.status.parse()?,
            franchise_fee: self.franchise_fee,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
