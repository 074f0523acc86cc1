use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::io::Read;

use crate::application::ExpenseService;
use crate::domain::{Expense, ExpenseDraft};
use crate::storage::ExpenseStore;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import.
/// `line` is the CSV line number, or the 1-based entry index for JSON.
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Validate every row but add nothing.
    pub dry_run: bool,
    /// Skip rows identical (date, category, amount, description) to an
    /// expense already in the ledger.
    pub skip_duplicates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ImportFormat::Csv),
            "json" => Some(ImportFormat::Json),
            _ => None,
        }
    }
}

/// A draft together with where it came from.
#[derive(Debug, Clone)]
struct ParsedRow {
    line: usize,
    draft: ExpenseDraft,
}

/// Importer for loading expenses into the ledger
pub struct Importer<'a, S: ExpenseStore> {
    service: &'a mut ExpenseService<S>,
}

impl<'a, S: ExpenseStore> Importer<'a, S> {
    pub fn new(service: &'a mut ExpenseService<S>) -> Self {
        Self { service }
    }

    pub async fn import<R: Read>(
        &mut self,
        format: ImportFormat,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let (rows, errors) = match format {
            ImportFormat::Csv => parse_csv(reader)?,
            ImportFormat::Json => parse_json(reader)?,
        };
        self.apply(rows, errors, options).await
    }

    async fn apply(
        &mut self,
        rows: Vec<ParsedRow>,
        mut errors: Vec<ImportError>,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut skipped = 0;
        let mut accepted: Vec<ParsedRow> = Vec::new();
        let mut accepted_expenses: Vec<Expense> = Vec::new();

        for row in rows {
            let expense = match row.draft.validate() {
                Ok(expense) => expense,
                Err(e) => {
                    errors.push(ImportError {
                        line: row.line,
                        field: Some(e.field().to_string()),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if options.skip_duplicates
                && self
                    .service
                    .expenses()
                    .iter()
                    .chain(accepted_expenses.iter())
                    .any(|existing| same_content(existing, &expense))
            {
                skipped += 1;
                continue;
            }

            accepted.push(row);
            accepted_expenses.push(expense);
        }

        if options.dry_run {
            errors.sort_by_key(|e| e.line);
            return Ok(ImportResult {
                imported: accepted.len(),
                skipped,
                errors,
            });
        }

        let drafts: Vec<ExpenseDraft> = accepted.iter().map(|r| r.draft.clone()).collect();
        let outcomes = self.service.add_expenses(&drafts).await?;

        let mut imported = 0;
        for (row, outcome) in accepted.iter().zip(outcomes) {
            match outcome {
                Ok(_) => imported += 1,
                Err(e) => errors.push(ImportError {
                    line: row.line,
                    field: Some(e.field().to_string()),
                    error: e.to_string(),
                }),
            }
        }
        errors.sort_by_key(|e| e.line);

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

fn same_content(a: &Expense, b: &Expense) -> bool {
    a.date() == b.date()
        && a.category() == b.category()
        && a.amount_cents() == b.amount_cents()
        && a.description() == b.description()
}

/// Read CSV rows by header name. `date`, `category` and `amount` are
/// required columns; `description` is optional and any other column
/// (such as an exported `id`) is ignored.
fn parse_csv<R: Read>(reader: R) -> Result<(Vec<ParsedRow>, Vec<ImportError>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers().context("Failed to read CSV header")?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    };

    let (Some(date_col), Some(category_col), Some(amount_col)) =
        (column("date"), column("category"), column("amount"))
    else {
        bail!("CSV header must contain date, category and amount columns");
    };
    let description_col = column("description");

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        let fallback_line = index + 2; // +2 for header and 0-indexing

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(ImportError {
                    line: e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_line),
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        let field = |col: usize| record.get(col).unwrap_or("").to_string();
        let draft = ExpenseDraft::new(field(amount_col), field(category_col), field(date_col))
            .with_description(description_col.map(field).unwrap_or_default());

        rows.push(ParsedRow { line, draft });
    }

    Ok((rows, errors))
}

/// Read a JSON array in the persisted shape. Each entry is checked on its
/// own; amounts may be numbers or numeric strings.
fn parse_json<R: Read>(reader: R) -> Result<(Vec<ParsedRow>, Vec<ImportError>)> {
    let entries: Vec<Value> =
        serde_json::from_reader(reader).context("Expected a JSON array of expenses")?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let line = index + 1;
        match entry_to_draft(entry) {
            Ok(draft) => rows.push(ParsedRow { line, draft }),
            Err((field, error)) => errors.push(ImportError {
                line,
                field: Some(field.to_string()),
                error,
            }),
        }
    }

    Ok((rows, errors))
}

fn entry_to_draft(entry: &Value) -> std::result::Result<ExpenseDraft, (&'static str, String)> {
    let Some(object) = entry.as_object() else {
        return Err(("entry", "not a JSON object".to_string()));
    };

    let amount = match object.get("amount") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(("amount", format!("not a number: {}", other))),
        None => return Err(("amount", "missing".to_string())),
    };
    let text = |field: &'static str, required: bool| match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None if !required => Ok(String::new()),
        None => Err((field, "missing".to_string())),
        Some(other) => Err((field, format!("not a string: {}", other))),
    };

    Ok(ExpenseDraft::new(amount, text("category", true)?, text("date", true)?)
        .with_description(text("description", false)?))
}
