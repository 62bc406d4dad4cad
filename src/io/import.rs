use anyhow::Result;
use chrono::NaiveDate;
use std::io::Read;

use crate::application::{TrackerService, TransactionQuery};
use crate::domain::{TransactionType, parse_cents};

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub validate_only: bool,
    pub skip_duplicates: bool,
    pub create_missing_categories: bool,
}

/// Importer for loading transactions into the tracker
pub struct Importer<'a> {
    service: &'a TrackerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a TrackerService) -> Self {
        Self { service }
    }

    /// Import transactions from CSV with columns:
    /// date, type, amount, category, description
    pub async fn import_transactions_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let date_str = record.get(0).unwrap_or("");
            let type_str = record.get(1).unwrap_or("");
            let amount_str = record.get(2).unwrap_or("");
            let category = record.get(3).filter(|s| !s.is_empty());
            let description = record.get(4).unwrap_or("");

            let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
                Ok(d) => d,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: {}", e),
                    });
                    continue;
                }
            };

            let transaction_type: TransactionType = match type_str.parse() {
                Ok(tt) => tt,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("type".to_string()),
                        error: e,
                    });
                    continue;
                }
            };

            let amount_cents = match parse_cents(amount_str) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            if let Some(name) = category {
                if options.create_missing_categories && !options.validate_only {
                    if let Err(e) = ensure_category_exists(self.service, name).await {
                        errors.push(ImportError {
                            line,
                            field: Some("category".to_string()),
                            error: format!("Category error: {}", e),
                        });
                        continue;
                    }
                } else if !options.create_missing_categories
                    && self.service.get_category(name).await.is_err()
                {
                    errors.push(ImportError {
                        line,
                        field: Some("category".to_string()),
                        error: format!("Unknown category: {}", name),
                    });
                    continue;
                }
            }

            // Validation ends here; nothing is looked up or written
            if options.validate_only {
                imported += 1;
                continue;
            }

            if options.skip_duplicates
                && self
                    .is_duplicate(date, transaction_type, amount_cents, description)
                    .await?
            {
                skipped += 1;
                continue;
            }

            if options.dry_run {
                imported += 1;
                continue;
            }

            match self
                .service
                .record_transaction(amount_cents, description, date, transaction_type, category)
                .await
            {
                Ok(_) => imported += 1,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("Transaction creation failed: {}", e),
                    });
                }
            }
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }

    /// A duplicate shares date, type, amount and description with an
    /// existing transaction.
    async fn is_duplicate(
        &self,
        date: NaiveDate,
        transaction_type: TransactionType,
        amount_cents: i64,
        description: &str,
    ) -> Result<bool> {
        let existing = self
            .service
            .list_transactions(TransactionQuery {
                transaction_type: Some(transaction_type),
                min_amount: Some(amount_cents),
                max_amount: Some(amount_cents),
                start_date: Some(date),
                end_date: Some(date),
                ..Default::default()
            })
            .await?;

        Ok(existing.iter().any(|t| t.description == description.trim()))
    }
}

// Helper to ensure a category exists before importing into it
async fn ensure_category_exists(service: &TrackerService, name: &str) -> Result<()> {
    if service.get_category(name).await.is_ok() {
        return Ok(());
    }

    service.create_category(name).await?;
    Ok(())
}
