// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use conto::application::TrackerService;
use conto::domain::TransactionType;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(TrackerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = TrackerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: standard category setup
pub struct StandardCategories;

impl StandardCategories {
    /// Create the basic expense categories: Groceries, Dining, Rent, Transport
    pub async fn create_basic(service: &TrackerService) -> Result<()> {
        service.create_category("Groceries").await?;
        service.create_category("Dining").await?;
        service.create_category("Rent").await?;
        service.create_category("Transport").await?;
        Ok(())
    }

    /// Record an expense against a category
    pub async fn spend(
        service: &TrackerService,
        category: &str,
        amount_cents: i64,
        date: &str,
        description: &str,
    ) -> Result<()> {
        service
            .record_transaction(
                amount_cents,
                description,
                parse_date(date),
                TransactionType::Expense,
                Some(category),
            )
            .await?;
        Ok(())
    }

    /// Record income (uncategorized)
    pub async fn earn(
        service: &TrackerService,
        amount_cents: i64,
        date: &str,
        description: &str,
    ) -> Result<()> {
        service
            .record_transaction(
                amount_cents,
                description,
                parse_date(date),
                TransactionType::Income,
                None,
            )
            .await?;
        Ok(())
    }
}
