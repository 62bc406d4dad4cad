use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{TrackerService, TransactionQuery};
use crate::domain::{Budget, Category, Transaction};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

/// Exporter for converting tracker data to various formats
pub struct Exporter<'a> {
    service: &'a TrackerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a TrackerService) -> Self {
        Self { service }
    }

    /// Export transactions to CSV format
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let transactions = self
            .service
            .list_transactions(TransactionQuery::default())
            .await?;
        let names = self.service.category_names().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "type", "amount", "category", "description"])?;

        let mut count = 0;
        for tx in &transactions {
            let category_name = tx
                .category
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_default();

            csv_writer.write_record(&[
                tx.id.to_string(),
                tx.date.format("%Y-%m-%d").to_string(),
                tx.transaction_type.as_str().to_string(),
                crate::domain::format_cents(tx.amount_cents),
                category_name,
                tx.description.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export budgets to CSV format
    pub async fn export_budgets_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let budgets = self.service.list_budgets(None, None).await?;
        let names = self.service.category_names().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "category", "amount", "month", "year"])?;

        let mut count = 0;
        for budget in &budgets {
            let category_name = names.get(&budget.category).cloned().unwrap_or_default();

            csv_writer.write_record(&[
                budget.id.to_string(),
                category_name,
                crate::domain::format_cents(budget.amount_cents),
                budget.month.to_string(),
                budget.year.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export budget progress for a month to CSV format
    pub async fn export_progress_csv<W: Write>(
        &self,
        writer: W,
        month: u32,
        year: i32,
    ) -> Result<usize> {
        let progress = self.service.month_progress(month, year).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "category",
            "budget",
            "spent",
            "remaining",
            "percentage",
            "over_budget",
        ])?;

        let mut count = 0;
        for p in &progress {
            csv_writer.write_record(&[
                p.category_name.clone(),
                crate::domain::format_cents(p.budget_amount),
                crate::domain::format_cents(p.actual_spending),
                crate::domain::format_cents(p.remaining_amount),
                format!("{:.2}", p.spending_percentage),
                p.is_over_budget.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let categories = self.service.list_categories().await?;
        let transactions = self
            .service
            .list_transactions(TransactionQuery::default())
            .await?;
        let budgets = self.service.list_budgets(None, None).await?;

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            categories,
            transactions,
            budgets,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
