//! Postgres-backed users and loans.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | anything else | N/A | `Backend` |
//!
//! Loans have no foreign key to users: an owner that was deleted simply fails to
//! join and the loan reads back with an unexpanded owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use lendgate_auth::{Role, User, normalize_email};
use lendgate_core::{LoanId, UserId};
use lendgate_loans::{Loan, LoanStatus, LoanTerms, OwnerProjection, OwnerRef};

use super::{LoanStore, StoreError, UserStore};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const LOAN_COLUMNS: &str = r#"
    l.id, l.user_id, l.amount, l.interest_rate, l.tenure, l.status,
    l.created_at, l.updated_at,
    u.name AS owner_name, u.email AS owner_email
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_loan(&self, id: LoanId, expand: bool) -> Result<Option<Loan>, StoreError> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loans l LEFT JOIN users u ON u.id = l.user_id WHERE l.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_loan", e))?;

        row.map(|r| loan_from_row(&r, expand)).transpose()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Backend(msg),
            }
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("decode column '{name}': {e}")))
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = column(row, "role")?;
    Ok(User {
        id: UserId::from_uuid(column::<Uuid>(row, "id")?),
        name: column(row, "name")?,
        email: column(row, "email")?,
        password_hash: column(row, "password_hash")?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    })
}

fn loan_from_row(row: &PgRow, expand: bool) -> Result<Loan, StoreError> {
    let owner_id = UserId::from_uuid(column::<Uuid>(row, "user_id")?);
    let status: String = column(row, "status")?;
    let tenure: i64 = column(row, "tenure")?;

    let mut loan = Loan {
        id: LoanId::from_uuid(column::<Uuid>(row, "id")?),
        user: OwnerRef::Unexpanded(owner_id),
        terms: LoanTerms {
            amount: column(row, "amount")?,
            interest_rate: column(row, "interest_rate")?,
            tenure: u32::try_from(tenure)
                .map_err(|_| StoreError::Backend(format!("tenure out of range: {tenure}")))?,
        },
        status: status
            .parse::<LoanStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    };

    if expand {
        let name: Option<String> = column(row, "owner_name")?;
        let email: Option<String> = column(row, "owner_email")?;
        if let (Some(name), Some(email)) = (name, email) {
            loan.expand_owner(OwnerProjection {
                id: owner_id,
                name,
                email,
            });
        }
    }

    Ok(loan)
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn save(&self, user: User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LoanStore for PostgresStore {
    #[instrument(skip(self, loan), fields(loan_id = %loan.id), err)]
    async fn insert(&self, loan: Loan) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO loans (id, user_id, amount, interest_rate, tenure, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(loan.id.as_uuid())
        .bind(loan.owner_id().as_uuid())
        .bind(loan.terms.amount)
        .bind(loan.terms.interest_rate)
        .bind(i64::from(loan.terms.tenure))
        .bind(loan.status.as_str())
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_loan", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(loan_id = %id), err)]
    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        self.fetch_loan(id, false).await
    }

    #[instrument(skip(self), fields(loan_id = %id), err)]
    async fn find_by_id_expanded(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        self.fetch_loan(id, true).await
    }

    #[instrument(skip(self), err)]
    async fn list_expanded(&self) -> Result<Vec<Loan>, StoreError> {
        let sql = format!(
            "SELECT {LOAN_COLUMNS} FROM loans l LEFT JOIN users u ON u.id = l.user_id ORDER BY l.created_at ASC, l.id ASC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_loans", e))?;

        rows.iter().map(|r| loan_from_row(r, true)).collect()
    }

    #[instrument(skip(self, loan), fields(loan_id = %loan.id), err)]
    async fn save(&self, loan: Loan) -> Result<bool, StoreError> {
        // Owner and terms are immutable; only status and the timestamp move.
        let result = sqlx::query("UPDATE loans SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(loan.id.as_uuid())
            .bind(loan.status.as_str())
            .bind(loan.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_loan", e))?;
        Ok(result.rows_affected() > 0)
    }
}
