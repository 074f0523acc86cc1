use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// The two headline figures: everything, and the reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub reference_date: NaiveDate,
    pub count: usize,
    pub total: Cents,
    pub current_month: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub percentage: f64,
}

impl CategoryReport {
    pub fn get(&self, category: &str) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Spending per calendar month of one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub year: i32,
    pub months: Vec<MonthTotal>,
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotal {
    /// 1 = January
    pub month: u32,
    pub total: Cents,
}

impl TrendReport {
    /// The month with the highest spending, if anything was spent.
    pub fn peak(&self) -> Option<&MonthTotal> {
        self.months
            .iter()
            .filter(|m| m.total > 0)
            .max_by_key(|m| m.total)
    }
}
