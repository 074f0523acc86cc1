use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use super::{Cents, Expense, ExpenseDraft, ExpenseId, ValidationError, sum_cents};

/// Number of buckets in a yearly trend (January..December).
pub const MONTHS_IN_YEAR: usize = 12;

/// The in-memory, insertion-ordered sequence of expenses for a session.
///
/// All operations are synchronous and either succeed or leave the ledger
/// untouched. Positions are zero-based and shift after a removal, so callers
/// must not hold on to them across mutations; ids are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    expenses: Vec<Expense>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a ledger from persisted expenses, keeping their order.
    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        Self { expenses }
    }

    /// Validate a candidate expense and append it.
    /// Returns the position assigned to the new record.
    pub fn add(&mut self, draft: &ExpenseDraft) -> Result<usize, LedgerError> {
        let expense = draft.validate()?;
        Ok(self.push(expense))
    }

    /// Append an already validated expense. Returns its position.
    pub fn push(&mut self, expense: Expense) -> usize {
        self.expenses.push(expense);
        self.expenses.len() - 1
    }

    /// Remove the record at `position`; later records shift down by one.
    pub fn remove_at(&mut self, position: usize) -> Result<Expense, LedgerError> {
        if position >= self.expenses.len() {
            return Err(LedgerError::OutOfRange {
                position,
                len: self.expenses.len(),
            });
        }
        Ok(self.expenses.remove(position))
    }

    /// Remove the record with the given id.
    /// Returns the position it occupied together with the record.
    pub fn remove_by_id(&mut self, id: ExpenseId) -> Result<(usize, Expense), LedgerError> {
        let position = self.position_of(id).ok_or(LedgerError::NotFound(id))?;
        Ok((position, self.expenses.remove(position)))
    }

    /// Put a record back at `position` (clamped to the end).
    pub(crate) fn insert_at(&mut self, position: usize, expense: Expense) {
        let position = position.min(self.expenses.len());
        self.expenses.insert(position, expense);
    }

    /// Drop every record from `len` onwards.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.expenses.truncate(len);
    }

    /// Drop every record, returning them in order.
    pub(crate) fn take_all(&mut self) -> Vec<Expense> {
        std::mem::take(&mut self.expenses)
    }

    pub fn position_of(&self, id: ExpenseId) -> Option<usize> {
        self.expenses.iter().position(|e| e.id() == id)
    }

    pub fn get(&self, position: usize) -> Option<&Expense> {
        self.expenses.get(position)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// The full ordered sequence.
    pub fn list(&self) -> &[Expense] {
        &self.expenses
    }

    /// Owned copy of the sequence, for persistence.
    pub fn snapshot(&self) -> Vec<Expense> {
        self.expenses.clone()
    }

    /// Sum of every amount. Zero for an empty ledger.
    pub fn total(&self) -> Cents {
        sum_cents(self.expenses.iter().map(Expense::amount_cents))
    }

    /// Sum of the amounts dated in the same month and year as `reference`.
    pub fn current_month_total(&self, reference: NaiveDate) -> Cents {
        sum_cents(
            self.expenses
                .iter()
                .filter(|e| e.is_in_month(reference.year(), reference.month()))
                .map(Expense::amount_cents),
        )
    }

    /// Total per category present in the ledger.
    pub fn by_category(&self) -> HashMap<String, Cents> {
        let mut totals: HashMap<String, Cents> = HashMap::new();

        for expense in &self.expenses {
            let total = totals.entry(expense.category().to_string()).or_insert(0);
            *total = total.saturating_add(expense.amount_cents());
        }

        totals
    }

    /// Twelve monthly totals for `year`; index 0 is January.
    pub fn by_month(&self, year: i32) -> [Cents; MONTHS_IN_YEAR] {
        let mut months: [Cents; MONTHS_IN_YEAR] = [0; MONTHS_IN_YEAR];

        for expense in self.expenses.iter().filter(|e| e.date().year() == year) {
            let month = &mut months[expense.date().month0() as usize];
            *month = month.saturating_add(expense.amount_cents());
        }

        months
    }

    /// Every year with at least one recorded expense, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.expenses.iter().map(|e| e.date().year()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    Validation(ValidationError),
    OutOfRange { position: usize, len: usize },
    NotFound(ExpenseId),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Validation(err) => write!(f, "{}", err),
            LedgerError::OutOfRange { position, len } => write!(
                f,
                "No expense at position {} (ledger holds {} expense(s))",
                position, len
            ),
            LedgerError::NotFound(id) => write!(f, "Expense not found: {}", id),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: &str, category: &str, date: &str) -> ExpenseDraft {
        ExpenseDraft::new(amount, category, date)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::new();
        assert_eq!(ledger.total(), 0);
        assert!(ledger.by_category().is_empty());
        assert_eq!(ledger.by_month(2024), [0; 12]);
        assert_eq!(ledger.current_month_total(date("2024-03-01")), 0);
    }

    #[test]
    fn test_add_returns_position() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.add(&draft("10", "Food", "2024-01-01")), Ok(0));
        assert_eq!(ledger.add(&draft("20", "Food", "2024-01-02")), Ok(1));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total(), 3000);
    }

    #[test]
    fn test_failed_add_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("10", "Food", "2024-01-01")).unwrap();
        let before = ledger.clone();

        let result = ledger.add(&draft("-5", "Food", "2024-01-01"));
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let result = ledger.add(&draft("5", "Food", "not a date"));
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_aggregates_saturate_instead_of_overflowing() {
        let largest = crate::domain::MAX_CENTS;
        let count = Cents::MAX / largest + 2;
        let expenses: Vec<Expense> = (0..count)
            .map(|_| {
                Expense::restore(ExpenseId::new_v4(), largest, "House", date("2024-03-01"), "")
                    .unwrap()
            })
            .collect();
        let ledger = Ledger::from_expenses(expenses);

        assert_eq!(ledger.total(), Cents::MAX);
        assert_eq!(ledger.current_month_total(date("2024-03-15")), Cents::MAX);
        assert_eq!(ledger.by_category()["House"], Cents::MAX);
        assert_eq!(ledger.by_month(2024)[2], Cents::MAX);
    }

    #[test]
    fn test_remove_at_empty_ledger() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.remove_at(0),
            Err(LedgerError::OutOfRange {
                position: 0,
                len: 0
            })
        );
    }

    #[test]
    fn test_remove_at_preserves_order() {
        let mut ledger = Ledger::new();
        for (i, amount) in ["1", "2", "3", "4"].iter().enumerate() {
            ledger
                .add(&draft(amount, "Misc", &format!("2024-01-0{}", i + 1)))
                .unwrap();
        }
        let ids: Vec<_> = ledger.list().iter().map(Expense::id).collect();

        let removed = ledger.remove_at(1).unwrap();

        assert_eq!(removed.id(), ids[1]);
        let remaining: Vec<_> = ledger.list().iter().map(Expense::id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
        assert_eq!(ledger.total(), 800);
    }

    #[test]
    fn test_remove_by_id() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("1", "A", "2024-01-01")).unwrap();
        ledger.add(&draft("2", "B", "2024-01-01")).unwrap();
        let id = ledger.get(1).unwrap().id();

        let (position, removed) = ledger.remove_by_id(id).unwrap();
        assert_eq!(position, 1);
        assert_eq!(removed.category(), "B");
        assert_eq!(ledger.remove_by_id(id), Err(LedgerError::NotFound(id)));
    }

    #[test]
    fn test_insert_at_restores_position() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("1", "A", "2024-01-01")).unwrap();
        ledger.add(&draft("2", "B", "2024-01-01")).unwrap();
        ledger.add(&draft("3", "C", "2024-01-01")).unwrap();
        let before = ledger.clone();

        let removed = ledger.remove_at(1).unwrap();
        ledger.insert_at(1, removed);

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_by_category_merges_years() {
        let mut ledger = Ledger::new();
        ledger
            .add(&draft("500", "Food", "2024-03-15").with_description("lunch"))
            .unwrap();
        ledger
            .add(&draft("1200", "Food", "2023-03-10").with_description("dinner"))
            .unwrap();

        let by_category = ledger.by_category();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category.get("Food"), Some(&170000));

        assert_eq!(ledger.by_month(2024)[2], 50000);
        assert_eq!(ledger.by_month(2023)[2], 120000);
    }

    #[test]
    fn test_category_totals_sum_to_total() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("12.50", "Food", "2024-01-05")).unwrap();
        ledger.add(&draft("40", "Transport", "2024-02-01")).unwrap();
        ledger.add(&draft("3.99", "Food", "2023-12-31")).unwrap();
        ledger.add(&draft("0", "Gifts", "2024-06-30")).unwrap();

        let sum: Cents = ledger.by_category().values().sum();
        assert_eq!(sum, ledger.total());
        assert_eq!(ledger.by_category().get("Gifts"), Some(&0));
    }

    #[test]
    fn test_current_month_total_is_year_aware() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("100", "Food", "2024-03-01")).unwrap();
        ledger.add(&draft("50", "Food", "2024-03-31")).unwrap();
        ledger.add(&draft("999", "Food", "2023-03-15")).unwrap();
        ledger.add(&draft("7", "Food", "2024-04-01")).unwrap();

        assert_eq!(ledger.current_month_total(date("2024-03-20")), 15000);
    }

    #[test]
    fn test_by_month_single_year_sums_to_total() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("10", "A", "2024-01-31")).unwrap();
        ledger.add(&draft("20", "B", "2024-02-01")).unwrap();
        ledger.add(&draft("30", "A", "2024-12-31")).unwrap();

        let months = ledger.by_month(2024);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], 1000);
        assert_eq!(months[1], 2000);
        assert_eq!(months[11], 3000);
        assert_eq!(months.iter().sum::<Cents>(), ledger.total());
    }

    #[test]
    fn test_by_month_mixed_years() {
        let mut ledger = Ledger::new();
        ledger.add(&draft("10", "A", "2023-05-01")).unwrap();
        ledger.add(&draft("20", "A", "2024-05-01")).unwrap();
        ledger.add(&draft("40", "A", "2025-01-01")).unwrap();

        assert_eq!(ledger.by_month(2023).iter().sum::<Cents>(), 1000);
        assert_eq!(ledger.by_month(2024).iter().sum::<Cents>(), 2000);
        assert_eq!(ledger.by_month(2022), [0; 12]);
        assert_eq!(
            ledger.years().into_iter().collect::<Vec<_>>(),
            vec![2023, 2024, 2025]
        );
    }
}
