// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use outlay::application::ExpenseService;
use outlay::domain::{Expense, ExpenseDraft};
use outlay::storage::{ExpenseStore, JsonFileStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a service backed by a JSON file in a temporary directory
pub async fn json_service() -> Result<(ExpenseService<JsonFileStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = JsonFileStore::new(temp_dir.path().join("expenses.json"));
    let service = ExpenseService::open(store).await?;
    Ok((service, temp_dir))
}

/// Helper to create a service backed by a temporary SQLite database
pub async fn sqlite_service() -> Result<(ExpenseService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = SqliteStore::open(&temp_dir.path().join("test.db")).await?;
    let service = ExpenseService::open(store).await?;
    Ok((service, temp_dir))
}

pub async fn memory_service() -> Result<ExpenseService<MemoryStore>> {
    Ok(ExpenseService::open(MemoryStore::new()).await?)
}

pub fn draft(amount: &str, category: &str, date: &str) -> ExpenseDraft {
    ExpenseDraft::new(amount, category, date)
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// A store whose saves fail while `failing` is set.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ExpenseStore for FlakyStore {
    async fn load(&self) -> Result<Vec<Expense>> {
        self.inner.load().await
    }

    async fn save(&self, expenses: &[Expense]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.inner.save(expenses).await
    }
}
