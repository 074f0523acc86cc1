use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{DATE_FORMAT, Expense};

use super::{ExpenseStore, MIGRATION_001_EXPENSES};

/// SQLite-backed expense store. Ledger order is kept in the `position` column.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_EXPENSES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Connect + migrate.
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        Self::init(&db_url).await
    }

    /// Number of persisted expenses.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM expenses")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count expenses")?;
        Ok(row.get("count"))
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let date_str: String = row.get("date");
        let amount_cents: i64 = row.get("amount_cents");
        let category: String = row.get("category");
        let description: String = row.get("description");

        let id = Uuid::parse_str(&id_str).context("Invalid expense ID")?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .with_context(|| format!("Invalid date for expense {}", id))?;

        Ok(Expense::restore(
            id,
            amount_cents,
            category,
            date,
            description,
        )?)
    }
}

impl ExpenseStore for SqliteStore {
    async fn load(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            r#"
            SELECT id, amount_cents, category, date, description
            FROM expenses
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load expenses")?;

        let expenses = rows
            .iter()
            .map(Self::row_to_expense)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(count = expenses.len(), "loaded expenses from sqlite");
        Ok(expenses)
    }

    async fn save(&self, expenses: &[Expense]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM expenses")
            .execute(&mut *tx)
            .await
            .context("Failed to clear expenses")?;

        for (position, expense) in expenses.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO expenses (position, id, amount_cents, category, date, description)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(expense.id().to_string())
            .bind(expense.amount_cents())
            .bind(expense.category())
            .bind(expense.date().format(DATE_FORMAT).to_string())
            .bind(expense.description())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save expense {}", expense.id()))?;
        }

        tx.commit().await.context("Failed to commit expenses")?;
        tracing::debug!(count = expenses.len(), "saved expenses to sqlite");
        Ok(())
    }
}
