//! Persistence for the expense ledger.
//!
//! A store is loaded once at startup and handed the full ordered sequence
//! after every mutation.

mod json;
mod memory;
mod sqlite;

use anyhow::Result;

use crate::domain::Expense;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// SQL migration for the expenses table
pub const MIGRATION_001_EXPENSES: &str = include_str!("migrations/001_expenses.sql");

/// Backing storage for the ledger.
#[allow(async_fn_in_trait)]
pub trait ExpenseStore {
    /// Load every persisted expense in ledger order. An absent store is empty.
    async fn load(&self) -> Result<Vec<Expense>>;

    /// Replace the persisted sequence with `expenses`.
    async fn save(&self, expenses: &[Expense]) -> Result<()>;
}
