use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use uuid::Uuid;

use super::{Cents, MAX_CENTS, cents_from_units, cents_to_units, parse_cents};

pub type ExpenseId = Uuid;

/// Date format used on the wire and for user input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single recorded spending event.
///
/// An `Expense` can only be obtained from a validated [`ExpenseDraft`] or a
/// persisted record whose amount and date validate, so its amount is always a
/// number of cents in `0..=MAX_CENTS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord", into = "ExpenseRecord")]
pub struct Expense {
    id: ExpenseId,
    amount_cents: Cents,
    category: String,
    date: NaiveDate,
    description: String,
}

impl Expense {
    /// Rebuild an expense from stored fields, re-checking the amount.
    pub fn restore(
        id: ExpenseId,
        amount_cents: Cents,
        category: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if amount_cents < 0 {
            return Err(ValidationError::NegativeAmount(amount_cents));
        }
        if amount_cents > MAX_CENTS {
            return Err(ValidationError::AmountTooLarge(amount_cents));
        }
        Ok(Self {
            id,
            amount_cents,
            category: category.into().trim().to_string(),
            date,
            description: description.into(),
        })
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn amount_cents(&self) -> Cents {
        self.amount_cents
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// True when the expense falls in the given calendar month of the given year.
    /// `month` is 1-based.
    pub fn is_in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }
}

/// A candidate expense as it arrives from a form, the command line or an
/// import row. Nothing is checked until [`ExpenseDraft::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub amount: String,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
}

impl ExpenseDraft {
    pub fn new(
        amount: impl Into<String>,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            category: category.into(),
            date: date.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate the draft and turn it into an expense with a fresh id.
    pub fn validate(&self) -> Result<Expense, ValidationError> {
        let amount_cents = parse_cents(&self.amount)
            .map_err(|e| ValidationError::InvalidAmount(format!("'{}': {}", self.amount, e)))?;
        let date = parse_expense_date(&self.date)?;
        Expense::restore(
            Uuid::new_v4(),
            amount_cents,
            self.category.as_str(),
            date,
            self.description.as_str(),
        )
    }
}

/// Parse a calendar date. Accepts `YYYY-MM-DD`, and full RFC 3339 timestamps
/// whose date part (in their own offset) is used.
pub fn parse_expense_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

/// Persisted shape of an expense: a JSON object with a numeric `amount`,
/// an ISO-8601 `date` and an optional `id` (absent in legacy data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ExpenseId>,
    pub amount: Number,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
}

// Fractional amounts are written as `f64`. Every amount up to `MAX_CENTS` is
// well inside the range where that conversion reads back exactly.
impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        let cents = expense.amount_cents;
        let amount = if cents % 100 == 0 {
            Number::from(cents / 100)
        } else {
            Number::from_f64(cents_to_units(cents)).unwrap_or_else(|| Number::from(cents / 100))
        };
        Self {
            id: Some(expense.id),
            amount,
            category: expense.category,
            date: expense.date.format(DATE_FORMAT).to_string(),
            description: expense.description,
        }
    }
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = ValidationError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let units = record
            .amount
            .as_f64()
            .ok_or_else(|| ValidationError::InvalidAmount(record.amount.to_string()))?;
        let amount_cents = cents_from_units(units).map_err(|e| {
            ValidationError::InvalidAmount(format!("'{}': {}", record.amount, e))
        })?;
        let date = parse_expense_date(&record.date)?;
        Expense::restore(
            record.id.unwrap_or_else(Uuid::new_v4),
            amount_cents,
            record.category,
            date,
            record.description,
        )
    }
}

/// Why a candidate expense was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAmount(String),
    NegativeAmount(Cents),
    AmountTooLarge(Cents),
    InvalidDate(String),
}

impl ValidationError {
    /// Name of the draft field that was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount(_)
            | ValidationError::NegativeAmount(_)
            | ValidationError::AmountTooLarge(_) => "amount",
            ValidationError::InvalidDate(_) => "date",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidAmount(detail) => write!(f, "Invalid amount {}", detail),
            ValidationError::NegativeAmount(cents) => {
                write!(f, "Amount must not be negative ({} cents)", cents)
            }
            ValidationError::AmountTooLarge(cents) => {
                write!(f, "Amount is too large ({} cents)", cents)
            }
            ValidationError::InvalidDate(input) => {
                write!(f, "Invalid date '{}', expected YYYY-MM-DD", input)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draft() {
        let expense = ExpenseDraft::new("500", " Food ", "2024-03-15")
            .with_description("lunch")
            .validate()
            .unwrap();

        assert_eq!(expense.amount_cents(), 50000);
        assert_eq!(expense.category(), "Food");
        assert_eq!(expense.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(expense.description(), "lunch");
        assert!(expense.is_in_month(2024, 3));
        assert!(!expense.is_in_month(2023, 3));
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let result = ExpenseDraft::new("-5", "Food", "2024-03-15").validate();
        assert_eq!(result, Err(ValidationError::NegativeAmount(-500)));
    }

    #[test]
    fn test_validate_rejects_non_numeric_amount() {
        let result = ExpenseDraft::new("twelve", "Food", "2024-03-15").validate();
        assert!(matches!(result, Err(ValidationError::InvalidAmount(_))));
    }

    #[test]
    fn test_validate_rejects_bad_dates() {
        for date in ["", "2024-02-30", "15/03/2024", "yesterday"] {
            let result = ExpenseDraft::new("10", "Food", date).validate();
            assert!(
                matches!(result, Err(ValidationError::InvalidDate(_))),
                "{date} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rfc3339_date() {
        let date = parse_expense_date("2024-03-15T23:30:00+05:30").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_restore_rejects_negative() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let result = Expense::restore(Uuid::new_v4(), -1, "Food", date, "");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_shape() {
        let expense = ExpenseDraft::new("12.50", "Transport", "2024-01-02")
            .validate()
            .unwrap();
        let value = serde_json::to_value(&expense).unwrap();

        assert_eq!(value["amount"], serde_json::json!(12.5));
        assert_eq!(value["category"], "Transport");
        assert_eq!(value["date"], "2024-01-02");
        assert_eq!(value["description"], "");
        assert_eq!(value["id"], expense.id().to_string());

        let whole = ExpenseDraft::new("500", "Food", "2024-01-02")
            .validate()
            .unwrap();
        assert_eq!(serde_json::to_value(&whole).unwrap()["amount"], 500);
    }

    #[test]
    fn test_restore_rejects_oversized_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(Expense::restore(Uuid::new_v4(), MAX_CENTS, "Food", date, "").is_ok());
        assert_eq!(
            Expense::restore(Uuid::new_v4(), MAX_CENTS + 1, "Food", date, ""),
            Err(ValidationError::AmountTooLarge(MAX_CENTS + 1))
        );
    }

    #[test]
    fn test_validate_rejects_overflowing_amount() {
        let result = ExpenseDraft::new("92233720368547758.99", "Food", "2024-03-15").validate();
        assert!(matches!(result, Err(ValidationError::InvalidAmount(_))));
    }

    #[test]
    fn test_largest_fractional_amount_survives_json() {
        let expense = ExpenseDraft::new("999999999999.99", "House", "2024-01-02")
            .validate()
            .unwrap();
        let json = serde_json::to_string(&expense).unwrap();
        let back: Expense = serde_json::from_str(&json).unwrap();

        assert_eq!(back.amount_cents(), MAX_CENTS - 1);
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let json = r#"{"amount": 1e13, "category": "Food", "date": "2023-03-10"}"#;
        assert!(serde_json::from_str::<Expense>(json).is_err());
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(ValidationError::InvalidAmount("x".into()).field(), "amount");
        assert_eq!(ValidationError::NegativeAmount(-1).field(), "amount");
        assert_eq!(ValidationError::AmountTooLarge(MAX_CENTS + 1).field(), "amount");
        assert_eq!(ValidationError::InvalidDate("x".into()).field(), "date");
    }

    #[test]
    fn test_legacy_record_without_id() {
        let json = r#"{"amount": 1200, "category": "Food", "date": "2023-03-10", "description": "dinner"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();

        assert_eq!(expense.amount_cents(), 120000);
        assert_eq!(expense.description(), "dinner");
    }

    #[test]
    fn test_record_with_negative_amount_is_rejected() {
        let json = r#"{"amount": -3, "category": "Food", "date": "2023-03-10"}"#;
        assert!(serde_json::from_str::<Expense>(json).is_err());
    }
}
