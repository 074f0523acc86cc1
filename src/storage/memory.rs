use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::domain::Expense;

use super::ExpenseStore;

/// Keeps the persisted sequence in process memory.
/// Useful for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    expenses: Mutex<Vec<Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already persisted sequence.
    pub fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            expenses: Mutex::new(expenses),
        }
    }

    /// What was last saved.
    pub fn saved(&self) -> Vec<Expense> {
        self.expenses
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ExpenseStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Expense>> {
        let guard = self
            .expenses
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    async fn save(&self, expenses: &[Expense]) -> Result<()> {
        let mut guard = self
            .expenses
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        *guard = expenses.to_vec();
        Ok(())
    }
}
