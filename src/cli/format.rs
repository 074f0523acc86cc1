use crate::config::{DisplaySettings, Grouping};
use crate::domain::Cents;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Renders amounts the way the user configured: currency symbol, digit
/// grouping, and at most two fractional digits (trailing zeros dropped).
#[derive(Debug, Clone)]
pub struct MoneyFormat {
    currency: String,
    grouping: Grouping,
}

impl MoneyFormat {
    pub fn new(currency: impl Into<String>, grouping: Grouping) -> Self {
        Self {
            currency: currency.into(),
            grouping,
        }
    }

    pub fn from_settings(display: &DisplaySettings) -> Self {
        Self::new(display.currency.clone(), display.grouping)
    }

    pub fn format(&self, cents: Cents) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let abs_cents = cents.unsigned_abs();
        let units = group_digits(&(abs_cents / 100).to_string(), self.grouping);
        let fraction = match abs_cents % 100 {
            0 => String::new(),
            n if n % 10 == 0 => format!(".{}", n / 10),
            n => format!(".{:02}", n),
        };
        format!("{}{}{}{}", sign, self.currency, units, fraction)
    }
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let group_size = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group_size);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

/// A horizontal bar proportional to `value / max`, at most `width` cells.
pub fn bar(value: Cents, max: Cents, width: usize) -> String {
    if value <= 0 || max <= 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

pub fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
