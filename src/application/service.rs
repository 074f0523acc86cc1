use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{
    Cents, Expense, ExpenseDraft, ExpenseId, Ledger, MONTHS_IN_YEAR, ValidationError, sum_cents,
};
use crate::storage::ExpenseStore;

use super::{AppError, CategoryReport, CategorySummary, MonthTotal, Summary, TrendReport};

/// Application service owning the ledger and its store.
/// This is the primary interface for any client (CLI, TUI, etc.).
///
/// Every mutation is flushed to the store before it returns. When the flush
/// fails the mutation is undone, so the in-memory ledger never runs ahead of
/// what is persisted.
pub struct ExpenseService<S: ExpenseStore> {
    ledger: Ledger,
    store: S,
}

impl<S: ExpenseStore> ExpenseService<S> {
    /// Load the persisted expenses from `store` into a fresh ledger.
    pub async fn open(store: S) -> Result<Self, AppError> {
        let expenses = store.load().await?;
        tracing::info!(count = expenses.len(), "ledger loaded");
        Ok(Self {
            ledger: Ledger::from_expenses(expenses),
            store,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The ordered list of expenses, for display.
    pub fn expenses(&self) -> &[Expense] {
        self.ledger.list()
    }

    async fn persist(&self) -> Result<(), AppError> {
        self.store.save(self.ledger.list()).await?;
        Ok(())
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new expense. Returns its position in the ledger.
    pub async fn add_expense(&mut self, draft: &ExpenseDraft) -> Result<usize, AppError> {
        let position = self.ledger.add(draft)?;

        if let Err(err) = self.persist().await {
            self.ledger.truncate(position);
            tracing::warn!(error = %err, "save failed, expense not added");
            return Err(err);
        }

        if let Some(expense) = self.ledger.get(position) {
            tracing::info!(
                id = %expense.id(),
                position,
                amount_cents = expense.amount_cents(),
                category = expense.category(),
                "expense added"
            );
        }
        Ok(position)
    }

    /// Record several expenses with a single save.
    ///
    /// Drafts are validated independently: the returned vector holds, for each
    /// draft in order, either its new position or why it was rejected. Nothing
    /// is added if the save fails.
    pub async fn add_expenses(
        &mut self,
        drafts: &[ExpenseDraft],
    ) -> Result<Vec<Result<usize, ValidationError>>, AppError> {
        let original_len = self.ledger.len();
        let outcomes: Vec<Result<usize, ValidationError>> = drafts
            .iter()
            .map(|draft| draft.validate().map(|expense| self.ledger.push(expense)))
            .collect();

        let added = self.ledger.len() - original_len;
        if added == 0 {
            return Ok(outcomes);
        }

        if let Err(err) = self.persist().await {
            self.ledger.truncate(original_len);
            tracing::warn!(error = %err, added, "save failed, batch discarded");
            return Err(err);
        }

        tracing::info!(added, rejected = drafts.len() - added, "expenses added");
        Ok(outcomes)
    }

    /// Remove the expense at `position`.
    pub async fn remove_at(&mut self, position: usize) -> Result<Expense, AppError> {
        let removed = self.ledger.remove_at(position)?;
        self.finish_removal(position, removed).await
    }

    /// Remove the expense with the given id.
    pub async fn remove_by_id(&mut self, id: ExpenseId) -> Result<Expense, AppError> {
        let (position, removed) = self.ledger.remove_by_id(id)?;
        self.finish_removal(position, removed).await
    }

    async fn finish_removal(
        &mut self,
        position: usize,
        removed: Expense,
    ) -> Result<Expense, AppError> {
        if let Err(err) = self.persist().await {
            tracing::warn!(error = %err, id = %removed.id(), "save failed, expense restored");
            self.ledger.insert_at(position, removed);
            return Err(err);
        }

        tracing::info!(id = %removed.id(), position, "expense removed");
        Ok(removed)
    }

    /// Remove every expense. Returns how many were removed.
    pub async fn clear(&mut self) -> Result<usize, AppError> {
        let previous = self.ledger.take_all();
        let count = previous.len();

        if let Err(err) = self.persist().await {
            tracing::warn!(error = %err, "save failed, ledger not cleared");
            self.ledger = Ledger::from_expenses(previous);
            return Err(err);
        }

        tracing::info!(count, "ledger cleared");
        Ok(count)
    }

    // ========================
    // Reports
    // ========================

    /// Overall total and the total for the month of `reference_date`.
    pub fn summary(&self, reference_date: NaiveDate) -> Summary {
        Summary {
            reference_date,
            count: self.ledger.len(),
            total: self.ledger.total(),
            current_month: self.ledger.current_month_total(reference_date),
        }
    }

    /// Per-category totals, largest first.
    pub fn category_report(&self) -> CategoryReport {
        let total = self.ledger.total();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for expense in self.ledger.list() {
            *counts.entry(expense.category()).or_insert(0) += 1;
        }

        let mut categories: Vec<CategorySummary> = self
            .ledger
            .by_category()
            .into_iter()
            .map(|(category, category_total)| CategorySummary {
                count: counts.get(category.as_str()).copied().unwrap_or(0),
                percentage: percentage_of(category_total, total),
                total: category_total,
                category,
            })
            .collect();

        categories.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });

        CategoryReport { categories, total }
    }

    /// Monthly totals for `year`.
    pub fn trend_report(&self, year: i32) -> TrendReport {
        let by_month = self.ledger.by_month(year);
        let months = by_month
            .iter()
            .enumerate()
            .map(|(index, &total)| MonthTotal {
                month: index as u32 + 1,
                total,
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(months.len(), MONTHS_IN_YEAR);

        TrendReport {
            year,
            total: sum_cents(by_month),
            months,
        }
    }

    /// Years that have recorded expenses, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.ledger.years().into_iter().collect()
    }
}

fn percentage_of(part: Cents, whole: Cents) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
