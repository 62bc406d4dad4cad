use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::application::{TrackerService, TransactionQuery};
use crate::domain::{
    TransactionType, current_month, format_cents, month_name, parse_cents,
};

/// Conto - Personal Finance Tracker
#[derive(Parser)]
#[command(name = "conto")]
#[command(about = "A local-first personal finance tracker with monthly category budgets")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "conto.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Transaction commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show budget progress for a month
    Progress {
        /// Month 1-12 (defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Four-digit year (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show budget alerts for a month
    Alerts {
        /// Month 1-12 (defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Four-digit year (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show income/expense summary for a month
    Summary {
        /// Month 1-12 (defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Four-digit year (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, budgets, progress, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Month for progress export (defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year for progress export (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Import transactions from CSV
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Check the file for errors without importing
        #[arg(long)]
        validate_only: bool,

        /// Skip duplicate records
        #[arg(long)]
        skip_duplicates: bool,

        /// Create categories that don't exist
        #[arg(long)]
        create_categories: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    Add {
        /// Category name (must be unique)
        name: String,
    },

    /// List all categories
    List,

    /// Delete a category (its transactions become uncategorized)
    Delete {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Record a transaction
    Add {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Transaction type: income, expense, transfer
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,

        /// Description of the transaction
        #[arg(short = 'm', long)]
        description: String,

        /// Category name (omit for uncategorized)
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions
    List {
        /// Filter by category name
        #[arg(long)]
        category: Option<String>,

        /// Filter by type: income, expense, transfer
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Minimum amount
        #[arg(long)]
        min_amount: Option<String>,

        /// Maximum amount
        #[arg(long)]
        max_amount: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a budget for a category and month
    Set {
        /// Category name
        category: String,

        /// Budget amount (e.g., "400" or "400.00")
        #[arg(short, long)]
        amount: String,

        /// Month 1-12 (defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Four-digit year (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// List budgets
    List {
        /// Filter by month
        #[arg(short, long)]
        month: Option<u32>,

        /// Filter by year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Delete a budget
    Delete {
        /// Budget id
        id: i64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let verbose = self.verbose;

        match self.command {
            Commands::Init => {
                TrackerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Category(category_cmd) => {
                let service = open_service(&self.database, verbose).await?;
                run_category_command(&service, category_cmd).await?;
            }

            Commands::Tx(tx_cmd) => {
                let service = open_service(&self.database, verbose).await?;
                run_tx_command(&service, tx_cmd).await?;
            }

            Commands::Budget(budget_cmd) => {
                let service = open_service(&self.database, verbose).await?;
                run_budget_command(&service, budget_cmd).await?;
            }

            Commands::Progress { month, year } => {
                let service = open_service(&self.database, verbose).await?;
                let (month, year) = resolve_period(month, year);
                run_progress_command(&service, month, year).await?;
            }

            Commands::Alerts { month, year } => {
                let service = open_service(&self.database, verbose).await?;
                let (month, year) = resolve_period(month, year);

                let alerts = service.month_alerts(month, year).await?;
                if alerts.is_empty() {
                    println!("No alerts for {} {}.", month_name(month), year);
                } else {
                    for alert in alerts {
                        println!("[{}] {}", alert.level, alert.message);
                    }
                }
            }

            Commands::Summary { month, year } => {
                let service = open_service(&self.database, verbose).await?;
                let (month, year) = resolve_period(month, year);

                let summary = service.month_summary(month, year).await?;
                println!("Summary for {} {}", month_name(month), year);
                println!("  Income:   {:>12}", format_cents(summary.income));
                println!("  Expenses: {:>12}", format_cents(summary.expenses));
                println!("  {}", "-".repeat(22));
                println!("  Net:      {:>12}", format_cents(summary.net));
            }

            Commands::Export {
                export_type,
                output,
                month,
                year,
            } => {
                let service = open_service(&self.database, verbose).await?;
                let (month, year) = resolve_period(month, year);
                run_export_command(
                    &service,
                    &export_type,
                    output.as_deref(),
                    month,
                    year,
                    verbose,
                )
                .await?;
            }

            Commands::Import {
                input,
                dry_run,
                validate_only,
                skip_duplicates,
                create_categories,
            } => {
                let service = open_service(&self.database, verbose).await?;
                run_import_command(
                    &service,
                    input.as_deref(),
                    dry_run,
                    validate_only,
                    skip_duplicates,
                    create_categories,
                    verbose,
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn open_service(database: &str, verbose: bool) -> Result<TrackerService> {
    if verbose {
        eprintln!("Using database: {}", database);
    }
    Ok(TrackerService::connect(database).await?)
}

fn resolve_period(month: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let (current_m, current_y) = current_month();
    (month.unwrap_or(current_m), year.unwrap_or(current_y))
}

async fn run_category_command(service: &TrackerService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::Add { name } => {
            let category = service.create_category(&name).await?;
            println!("Created category: {} (#{})", category.name, category.id);
        }

        CategoryCommands::List => {
            let categories = service.list_categories().await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<6} {:<20} {:<12}", "ID", "NAME", "CREATED");
                println!("{}", "-".repeat(40));
                for category in categories {
                    println!(
                        "{:<6} {:<20} {:<12}",
                        category.id,
                        category.name,
                        category.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        CategoryCommands::Delete { name } => {
            service.delete_category(&name).await?;
            println!("Deleted category: {}", name);
        }
    }
    Ok(())
}

async fn run_tx_command(service: &TrackerService, cmd: TxCommands) -> Result<()> {
    match cmd {
        TxCommands::Add {
            amount,
            transaction_type,
            description,
            category,
            date,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

            let transaction_type: TransactionType = transaction_type.parse().map_err(|e| {
                anyhow::anyhow!(
                    "Invalid transaction type. Valid types: income, expense, transfer. Error: {}",
                    e
                )
            })?;

            let date = match date {
                Some(date_str) => parse_date(&date_str).with_context(|| {
                    format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                })?,
                None => chrono::Utc::now().date_naive(),
            };

            let tx = service
                .record_transaction(
                    amount_cents,
                    &description,
                    date,
                    transaction_type,
                    category.as_deref(),
                )
                .await?;

            println!(
                "Recorded {}: {} on {} (#{})",
                tx.transaction_type,
                format_cents(tx.amount_cents),
                tx.date.format("%Y-%m-%d"),
                tx.id
            );
        }

        TxCommands::List {
            category,
            transaction_type,
            min_amount,
            max_amount,
            from_date,
            to_date,
            limit,
        } => {
            let category_id = match category {
                Some(name) => Some(service.get_category(&name).await?.id),
                None => None,
            };
            let transaction_type = transaction_type
                .map(|s| s.parse::<TransactionType>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("Invalid transaction type: {}", e))?;
            let min_amount = min_amount
                .map(|s| parse_cents(&s))
                .transpose()
                .context("Invalid min-amount")?;
            let max_amount = max_amount
                .map(|s| parse_cents(&s))
                .transpose()
                .context("Invalid max-amount")?;
            let start_date = from_date
                .map(|s| parse_date(&s))
                .transpose()
                .context("Invalid from-date")?;
            let end_date = to_date
                .map(|s| parse_date(&s))
                .transpose()
                .context("Invalid to-date")?;

            let transactions = service
                .list_transactions(TransactionQuery {
                    category: category_id,
                    transaction_type,
                    min_amount,
                    max_amount,
                    start_date,
                    end_date,
                    limit,
                })
                .await?;

            if transactions.is_empty() {
                println!("No transactions found.");
            } else {
                let names = service.category_names().await?;

                println!(
                    "{:<6} {:<12} {:<10} {:>10} {:<15} DESCRIPTION",
                    "ID", "DATE", "TYPE", "AMOUNT", "CATEGORY"
                );
                println!("{}", "-".repeat(70));

                for tx in transactions {
                    let category_name = tx
                        .category
                        .and_then(|id| names.get(&id).map(|s| s.as_str()))
                        .unwrap_or("-");

                    println!(
                        "{:<6} {:<12} {:<10} {:>10} {:<15} {}",
                        tx.id,
                        tx.date.format("%Y-%m-%d"),
                        tx.transaction_type,
                        format_cents(tx.amount_cents),
                        truncate(category_name, 15),
                        truncate(&tx.description, 30)
                    );
                }
            }
        }

        TxCommands::Delete { id } => {
            let tx = service.delete_transaction(id).await?;
            println!(
                "Deleted transaction #{}: {} ({})",
                tx.id,
                format_cents(tx.amount_cents),
                tx.description
            );
        }
    }

    Ok(())
}

async fn run_budget_command(service: &TrackerService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            month,
            year,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400.00' or '400'")?;
            let (month, year) = resolve_period(month, year);

            let budget = service
                .set_budget(&category, amount_cents, month, year)
                .await?;
            println!(
                "Set budget: {} for {} in {} {} (#{})",
                format_cents(budget.amount_cents),
                category,
                month_name(budget.month),
                budget.year,
                budget.id
            );
        }

        BudgetCommands::List { month, year } => {
            let budgets = service.list_budgets(month, year).await?;
            if budgets.is_empty() {
                println!("No budgets found.");
            } else {
                let names = service.category_names().await?;

                println!(
                    "{:<6} {:<15} {:>12} {:<12}",
                    "ID", "CATEGORY", "AMOUNT", "PERIOD"
                );
                println!("{}", "-".repeat(50));
                for budget in budgets {
                    let category_name = names
                        .get(&budget.category)
                        .map(|s| s.as_str())
                        .unwrap_or("Unknown");

                    println!(
                        "{:<6} {:<15} {:>12} {} {}",
                        budget.id,
                        truncate(category_name, 15),
                        format_cents(budget.amount_cents),
                        month_name(budget.month),
                        budget.year
                    );
                }
            }
        }

        BudgetCommands::Delete { id } => {
            service.delete_budget(id).await?;
            println!("Deleted budget #{}", id);
        }
    }

    Ok(())
}

async fn run_progress_command(service: &TrackerService, month: u32, year: i32) -> Result<()> {
    let progress = service.month_progress(month, year).await?;

    if progress.is_empty() {
        println!("No budgets set for {} {}.", month_name(month), year);
        println!("Use `conto budget set <category> --amount <amount>` to set one.");
        return Ok(());
    }

    println!("Budget progress for {} {}", month_name(month), year);
    println!();
    println!(
        "{:<15} {:>10} {:>10} {:>10}  {:<22} {:>8}",
        "CATEGORY", "BUDGET", "SPENT", "LEFT", "PROGRESS", "PCT"
    );
    println!("{}", "-".repeat(82));

    for p in &progress {
        let marker = if p.is_over_budget { " OVER" } else { "" };
        println!(
            "{:<15} {:>10} {:>10} {:>10}  {:<22} {:>7.1}%{}",
            truncate(&p.category_name, 15),
            format_cents(p.budget_amount),
            format_cents(p.actual_spending),
            format_cents(p.remaining_amount),
            progress_bar(p.spending_percentage, 20),
            p.spending_percentage,
            marker
        );
    }

    Ok(())
}

/// Render a fixed-width progress bar. The bar width is capped at 100% even
/// though the percentage itself is not.
fn progress_bar(percentage: f64, width: usize) -> String {
    let ratio = (percentage / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

async fn run_export_command(
    service: &TrackerService,
    export_type: &str,
    output: Option<&str>,
    month: u32,
    year: i32,
    verbose: bool,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(writer).await?;
            if verbose && output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "budgets" => {
            let count = exporter.export_budgets_csv(writer).await?;
            if verbose && output.is_some() {
                eprintln!("Exported {} budgets", count);
            }
        }
        "progress" => {
            let count = exporter.export_progress_csv(writer, month, year).await?;
            if verbose && output.is_some() {
                eprintln!("Exported progress for {} budgets", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if verbose && output.is_some() {
                eprintln!(
                    "Exported full database: {} categories, {} transactions, {} budgets",
                    snapshot.categories.len(),
                    snapshot.transactions.len(),
                    snapshot.budgets.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, budgets, progress, full",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &TrackerService,
    input: Option<&str>,
    dry_run: bool,
    validate_only: bool,
    skip_duplicates: bool,
    create_categories: bool,
    verbose: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let importer = Importer::new(service);

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
        validate_only,
        skip_duplicates,
        create_missing_categories: create_categories,
    };

    let result = importer.import_transactions_csv(reader, options).await?;

    if validate_only {
        println!("Validation complete");
    } else if dry_run {
        println!("Dry run complete");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        // Verbose shows every error, not just the first ten
        let shown = if verbose { result.errors.len() } else { 10 };

        println!("\nErrors:");
        for error in result.errors.iter().take(shown) {
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
        if result.errors.len() > shown {
            println!("  ... and {} more errors", result.errors.len() - shown);
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}
