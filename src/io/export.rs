use anyhow::Result;
use std::io::Write;

use crate::domain::{DATE_FORMAT, Expense, format_cents};

/// Column order of exported CSV files. Import accepts the same layout.
pub const CSV_HEADER: [&str; 5] = ["id", "date", "category", "amount", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Writes the ledger out in one of the supported formats.
pub struct Exporter<'a> {
    expenses: &'a [Expense],
}

impl<'a> Exporter<'a> {
    pub fn new(expenses: &'a [Expense]) -> Self {
        Self { expenses }
    }

    /// Export in `format`. Returns the number of expenses written.
    pub fn export<W: Write>(&self, format: ExportFormat, writer: W) -> Result<usize> {
        match format {
            ExportFormat::Csv => self.export_csv(writer),
            ExportFormat::Json => self.export_json(writer),
        }
    }

    /// Export expenses to CSV, amounts as plain decimal text.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;

        for expense in self.expenses {
            csv_writer.write_record([
                expense.id().to_string(),
                expense.date().format(DATE_FORMAT).to_string(),
                expense.category().to_string(),
                format_cents(expense.amount_cents()),
                expense.description().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.expenses.len())
    }

    /// Export expenses in the same JSON shape the file store persists.
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        serde_json::to_writer_pretty(&mut writer, self.expenses)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(self.expenses.len())
    }
}
