mod format;

pub use format::*;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::ExpenseService;
use crate::config::{self, Backend, Grouping, Settings};
use crate::domain::{
    DATE_FORMAT, Expense, ExpenseDraft, ExpenseId, format_cents, parse_expense_date, sum_cents,
};
use crate::storage::{ExpenseStore, JsonFileStore, SqliteStore};

/// Outlay - Personal Expense Tracker
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "A local-first personal expense tracker")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to ./outlay.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file path (overrides configuration)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Storage backend (overrides configuration)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Currency symbol used when printing amounts
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Digit grouping used when printing amounts
    #[arg(long, global = true, value_enum)]
    pub grouping: Option<Grouping>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// How report commands print their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an expense
    Add {
        /// Amount spent (e.g., "50.00" or "50")
        amount: String,

        /// Category (e.g., "Food", "Transport")
        #[arg(short, long)]
        category: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List recorded expenses
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Only show this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Remove an expense by id (or unique id prefix) or by position
    Remove {
        /// Expense id or a unique prefix of it
        #[arg(required_unless_present = "at", conflicts_with = "at")]
        id: Option<String>,

        /// Zero-based position as shown by `list`
        #[arg(long)]
        at: Option<usize>,
    },

    /// Show total spending and spending this month
    Summary {
        /// Reference date for "this month" (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Spending breakdown by category
    Categories {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Monthly spending trend for a year
    Trend {
        /// Year to show (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Export expenses to CSV or JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short = 'F', long, default_value = "csv")]
        format: String,
    },

    /// Import expenses from CSV or JSON
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Format: csv, json
        #[arg(short = 'F', long, default_value = "csv")]
        format: String,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip rows identical to an existing expense
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// Remove every expense
    Clear {
        /// Confirm removal of all expenses
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings =
            config::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(backend) = self.backend {
            settings.storage.backend = backend;
        }
        if let Some(file) = &self.file {
            settings.storage.path = Some(file.clone());
        }
        if let Some(currency) = &self.currency {
            settings.display.currency = currency.clone();
        }
        if let Some(grouping) = self.grouping {
            settings.display.grouping = grouping;
        }
        if self.verbose {
            settings.log.level = "debug".to_string();
        }

        Ok(settings)
    }

    pub async fn run(self) -> Result<()> {
        let settings = self.settings()?;
        init_tracing(&settings.log.level);

        let path = settings.storage.resolved_path();
        let money = MoneyFormat::from_settings(&settings.display);
        tracing::debug!(
            backend = ?settings.storage.backend,
            path = %path.display(),
            "opening expense store"
        );

        match settings.storage.backend {
            Backend::Json => {
                let service = ExpenseService::open(JsonFileStore::new(path)).await?;
                run_command(self.command, service, &money).await
            }
            Backend::Sqlite => {
                let store = SqliteStore::open(&path)
                    .await
                    .with_context(|| format!("Failed to open database: {}", path.display()))?;
                let service = ExpenseService::open(store).await?;
                run_command(self.command, service, &money).await
            }
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("outlay={level}")));

    // A subscriber may already be installed when running inside tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_command<S: ExpenseStore>(
    command: Commands,
    mut service: ExpenseService<S>,
    money: &MoneyFormat,
) -> Result<()> {
    match command {
        Commands::Add {
            amount,
            category,
            date,
            description,
        } => {
            let date = date.unwrap_or_else(|| today().format(DATE_FORMAT).to_string());
            let draft = ExpenseDraft::new(amount, category, date).with_description(description);
            let position = service.add_expense(&draft).await?;

            if let Some(expense) = service.ledger().get(position) {
                println!("Expense recorded: {}", expense.id());
                println!("  Amount:   {}", money.format(expense.amount_cents()));
                println!("  Category: {}", expense.category());
                println!("  Date:     {}", expense.date().format(DATE_FORMAT));
                if !expense.description().is_empty() {
                    println!("  Note:     {}", expense.description());
                }
            }
        }

        Commands::List {
            category,
            month,
            format,
        } => {
            let month = month.as_deref().map(parse_year_month).transpose()?;
            run_list_command(&service, category.as_deref(), month, format, money)?;
        }

        Commands::Remove { id, at } => {
            let removed = match (id, at) {
                (_, Some(position)) => service.remove_at(position).await?,
                (Some(prefix), None) => {
                    let id = resolve_id(service.expenses(), &prefix)?;
                    service.remove_by_id(id).await?
                }
                (None, None) => anyhow::bail!("Give an expense id or --at <POSITION>"),
            };
            println!(
                "Removed {} {} on {} ({})",
                money.format(removed.amount_cents()),
                removed.category(),
                removed.date().format(DATE_FORMAT),
                removed.id()
            );
        }

        Commands::Summary { date, format } => {
            let reference = match date {
                Some(date) => parse_expense_date(&date)?,
                None => today(),
            };
            let summary = service.summary(reference);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Csv => {
                    println!("date,count,total,current_month");
                    println!(
                        "{},{},{},{}",
                        reference.format(DATE_FORMAT),
                        summary.count,
                        format_cents(summary.total),
                        format_cents(summary.current_month)
                    );
                }
                OutputFormat::Table => {
                    println!("Expenses:     {}", summary.count);
                    println!("Total spent:  {:>15}", money.format(summary.total));
                    println!(
                        "{:<13} {:>15}",
                        format!("{}:", reference.format("%b %Y")),
                        money.format(summary.current_month)
                    );
                }
            }
        }

        Commands::Categories { format } => {
            let report = service.category_report();

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Csv => {
                    println!("category,total,count,percentage");
                    for cat in &report.categories {
                        println!(
                            "{},{},{},{:.2}",
                            cat.category,
                            format_cents(cat.total),
                            cat.count,
                            cat.percentage
                        );
                    }
                }
                OutputFormat::Table => {
                    if report.categories.is_empty() {
                        println!("No expenses recorded.");
                        return Ok(());
                    }
                    let max = report.categories.first().map(|c| c.total).unwrap_or(0);

                    println!(
                        "{:<20} {:>14} {:>6} {:>7}  {}",
                        "CATEGORY", "TOTAL", "COUNT", "SHARE", ""
                    );
                    println!("{}", "-".repeat(72));
                    for cat in &report.categories {
                        println!(
                            "{:<20} {:>14} {:>6} {:>6.1}%  {}",
                            truncate(&cat.category, 20),
                            money.format(cat.total),
                            cat.count,
                            cat.percentage,
                            bar(cat.total, max, 20)
                        );
                    }
                    println!("{}", "-".repeat(72));
                    println!("{:<20} {:>14}", "TOTAL", money.format(report.total));
                }
            }
        }

        Commands::Trend { year, format } => {
            let year = year.unwrap_or_else(|| today().year());
            let report = service.trend_report(year);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Csv => {
                    println!("month,total");
                    for month in &report.months {
                        println!(
                            "{}-{:02},{}",
                            report.year,
                            month.month,
                            format_cents(month.total)
                        );
                    }
                }
                OutputFormat::Table => {
                    let max = report.months.iter().map(|m| m.total).max().unwrap_or(0);

                    println!("Monthly Spending {}", report.year);
                    println!();
                    for month in &report.months {
                        println!(
                            "{:<4} {:>14}  {}",
                            month_label(month.month),
                            money.format(month.total),
                            bar(month.total, max, 30)
                        );
                    }
                    println!("{}", "-".repeat(50));
                    println!("{:<4} {:>14}", "", money.format(report.total));

                    if let Some(peak) = report.peak() {
                        println!("Peak: {}", month_label(peak.month));
                    }
                    let years = service.years();
                    if !years.is_empty() && !years.contains(&report.year) {
                        let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
                        println!("No expenses in {}. Years with data: {}", year, listed.join(", "));
                    }
                }
            }
        }

        Commands::Export { output, format } => {
            run_export_command(service.expenses(), output.as_deref(), &format)?;
        }

        Commands::Import {
            input,
            format,
            dry_run,
            skip_duplicates,
        } => {
            run_import_command(
                &mut service,
                input.as_deref(),
                &format,
                dry_run,
                skip_duplicates,
            )
            .await?;
        }

        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!(
                    "Refusing to remove {} expense(s) without --yes",
                    service.ledger().len()
                );
            }
            let count = service.clear().await?;
            println!("Removed {} expense(s)", count);
        }
    }

    Ok(())
}

fn run_list_command<S: ExpenseStore>(
    service: &ExpenseService<S>,
    category: Option<&str>,
    month: Option<(i32, u32)>,
    format: OutputFormat,
    money: &MoneyFormat,
) -> Result<()> {
    // Positions are taken before filtering so they stay usable with `remove --at`
    let rows: Vec<(usize, &Expense)> = service
        .expenses()
        .iter()
        .enumerate()
        .filter(|(_, e)| category.is_none_or(|c| e.category().eq_ignore_ascii_case(c)))
        .filter(|(_, e)| month.is_none_or(|(y, m)| e.is_in_month(y, m)))
        .collect();

    match format {
        OutputFormat::Json => {
            let expenses: Vec<&Expense> = rows.iter().map(|(_, e)| *e).collect();
            println!("{}", serde_json::to_string_pretty(&expenses)?);
        }
        OutputFormat::Csv => {
            let expenses: Vec<Expense> = rows.iter().map(|(_, e)| (*e).clone()).collect();
            crate::io::Exporter::new(&expenses).export_csv(std::io::stdout())?;
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No expenses found.");
                return Ok(());
            }

            println!(
                "{:>4}  {:<10}  {:<16} {:>14}  {:<24} {}",
                "#", "DATE", "CATEGORY", "AMOUNT", "DESCRIPTION", "ID"
            );
            println!("{}", "-".repeat(86));
            for (position, expense) in &rows {
                let id = expense.id().to_string();
                println!(
                    "{:>4}  {:<10}  {:<16} {:>14}  {:<24} {}",
                    position,
                    expense.date().format(DATE_FORMAT),
                    truncate(expense.category(), 16),
                    money.format(expense.amount_cents()),
                    truncate(expense.description(), 24),
                    &id[..8]
                );
            }
            println!("{}", "-".repeat(86));
            let shown = sum_cents(rows.iter().map(|(_, e)| e.amount_cents()));
            println!(
                "{:>4}  {:<10}  {:<16} {:>14}",
                "",
                format!("{} shown", rows.len()),
                "",
                money.format(shown)
            );
        }
    }

    Ok(())
}

fn run_export_command(expenses: &[Expense], output: Option<&str>, format: &str) -> Result<()> {
    use crate::io::{ExportFormat, Exporter};
    use std::fs::File;
    use std::io::{Write, stdout};

    let Some(export_format) = ExportFormat::from_str(format) else {
        anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
    };

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = Exporter::new(expenses).export(export_format, writer)?;
    if output.is_some() {
        eprintln!("Exported {} expenses as {}", count, export_format.as_str());
    }

    Ok(())
}

async fn run_import_command<S: ExpenseStore>(
    service: &mut ExpenseService<S>,
    input: Option<&str>,
    format: &str,
    dry_run: bool,
    skip_duplicates: bool,
) -> Result<()> {
    use crate::io::{ImportFormat, ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let Some(import_format) = ImportFormat::from_str(format) else {
        anyhow::bail!("Invalid import format '{}'. Valid formats: csv, json", format);
    };

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_duplicates,
    };
    let result = Importer::new(service)
        .import(import_format, reader, options)
        .await?;

    // Display results
    if dry_run {
        println!("Validation complete (nothing imported)");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse `YYYY-MM` into (year, month).
fn parse_year_month(input: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), DATE_FORMAT)
        .with_context(|| format!("Month must be in YYYY-MM format, got '{}'", input))?;
    Ok((date.year(), date.month()))
}

/// Find the expense whose id is `input` or starts with it.
fn resolve_id(expenses: &[Expense], input: &str) -> Result<ExpenseId> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let prefix = input.trim().to_lowercase();
    if prefix.is_empty() {
        anyhow::bail!("Expense id must not be empty");
    }

    let matches: Vec<ExpenseId> = expenses
        .iter()
        .map(Expense::id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => anyhow::bail!("No expense id starts with '{}'", input),
        _ => anyhow::bail!(
            "'{}' matches {} expenses; give more of the id",
            input,
            matches.len()
        ),
    }
}
