use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};

use crate::domain::{
    Budget, BudgetAlert, BudgetId, BudgetProgress, Category, CategoryId, Cents, MonthSummary,
    Transaction, TransactionId, TransactionType, budget_alerts, compute_budget_progress,
    month_bounds, summarize,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations for the tracker.
/// This is the primary interface for any client (CLI, exporter, tests).
pub struct TrackerService {
    repo: Repository,
}

/// Filter for querying transactions. Mirrors the query surface the records
/// were originally served with: category, type, amount range, date range.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub category: Option<CategoryId>,
    pub transaction_type: Option<TransactionType>,
    pub min_amount: Option<Cents>,
    pub max_amount: Option<Cents>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl TrackerService {
    /// Create a new tracker service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Category operations
    // ========================

    /// Create a new category. Names are trimmed and must be unique.
    pub async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        let name = name.trim();
        if name.len() < 2 {
            return Err(AppError::InvalidCategoryName);
        }
        if self.repo.get_category_by_name(name).await?.is_some() {
            return Err(AppError::CategoryAlreadyExists(name.to_string()));
        }

        let mut category = Category::new(name);
        self.repo.save_category(&mut category).await?;
        Ok(category)
    }

    /// Get a category by name.
    pub async fn get_category(&self, name: &str) -> Result<Category, AppError> {
        self.repo
            .get_category_by_name(name)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(name.to_string()))
    }

    /// List all categories, ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories().await?)
    }

    /// Delete a category. Its transactions become uncategorized; its budgets
    /// are removed with it.
    pub async fn delete_category(&self, name: &str) -> Result<Category, AppError> {
        let category = self.get_category(name).await?;
        self.repo.delete_category(category.id).await?;
        Ok(category)
    }

    /// Get a map of category IDs to names (useful for display).
    pub async fn category_names(&self) -> Result<HashMap<CategoryId, String>, AppError> {
        let categories = self.repo.list_categories().await?;
        Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new transaction.
    pub async fn record_transaction(
        &self,
        amount_cents: Cents,
        description: &str,
        date: NaiveDate,
        transaction_type: TransactionType,
        category_name: Option<&str>,
    ) -> Result<Transaction, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be greater than zero".to_string(),
            ));
        }
        let description = description.trim();
        if description.len() < 2 {
            return Err(AppError::InvalidDescription);
        }

        let mut transaction =
            Transaction::new(amount_cents, description, date, transaction_type);

        if let Some(name) = category_name {
            let category = self.get_category(name).await?;
            transaction = transaction.with_category(category.id);
        }

        self.repo.save_transaction(&mut transaction).await?;
        Ok(transaction)
    }

    /// Get a transaction by id.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))
    }

    /// List transactions with optional filters, most recent first.
    pub async fn list_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self
            .repo
            .list_transactions_filtered(
                query.category,
                query.transaction_type,
                query.min_amount,
                query.max_amount,
                query.start_date,
                query.end_date,
                query.limit,
            )
            .await?)
    }

    /// Delete a transaction by id.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        let transaction = self.get_transaction(id).await?;
        self.repo.delete_transaction(id).await?;
        Ok(transaction)
    }

    // ========================
    // Budget operations
    // ========================

    /// Create a budget for a category/month/year. At most one budget may
    /// exist per (category, month, year).
    pub async fn set_budget(
        &self,
        category_name: &str,
        amount_cents: Cents,
        month: u32,
        year: i32,
    ) -> Result<Budget, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::NonPositiveBudget(amount_cents));
        }
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidMonth(month));
        }
        let current = Utc::now().year();
        if (year - current).abs() > 5 {
            return Err(AppError::YearOutOfRange { year, current });
        }

        let category = self.get_category(category_name).await?;

        if self
            .repo
            .find_budget(category.id, month, year)
            .await?
            .is_some()
        {
            return Err(AppError::BudgetAlreadyExists {
                category: category.id,
                month,
                year,
            });
        }

        let mut budget = Budget::new(category.id, amount_cents, month, year);
        self.repo.save_budget(&mut budget).await?;
        Ok(budget)
    }

    /// List budgets, optionally narrowed to a month and/or year.
    /// Ordered most recent period first.
    pub async fn list_budgets(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<Budget>, AppError> {
        Ok(self.repo.list_budgets_filtered(month, year).await?)
    }

    /// Delete a budget by id.
    pub async fn delete_budget(&self, id: BudgetId) -> Result<Budget, AppError> {
        let budget = self
            .repo
            .get_budget(id)
            .await?
            .ok_or(AppError::BudgetNotFound(id))?;
        self.repo.delete_budget(id).await?;
        Ok(budget)
    }

    // ========================
    // Progress operations
    // ========================

    /// Compute progress for every budget of the given month: fetch the
    /// budgets and the month's transactions, then run the pure aggregation.
    pub async fn month_progress(
        &self,
        month: u32,
        year: i32,
    ) -> Result<Vec<BudgetProgress>, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidMonth(month));
        }

        let budgets = self
            .repo
            .list_budgets_filtered(Some(month), Some(year))
            .await?;
        let (start, end) = month_bounds(year, month);
        let transactions = self
            .list_transactions(TransactionQuery {
                start_date: Some(start),
                end_date: Some(end),
                ..Default::default()
            })
            .await?;
        let names = self.category_names().await?;

        Ok(compute_budget_progress(&budgets, &transactions, &names))
    }

    /// Derive threshold alerts for the given month's budgets.
    pub async fn month_alerts(&self, month: u32, year: i32) -> Result<Vec<BudgetAlert>, AppError> {
        let progress = self.month_progress(month, year).await?;
        Ok(budget_alerts(&progress))
    }

    /// Income/expense/net totals for the given month.
    pub async fn month_summary(&self, month: u32, year: i32) -> Result<MonthSummary, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidMonth(month));
        }

        let (start, end) = month_bounds(year, month);
        let transactions = self
            .list_transactions(TransactionQuery {
                start_date: Some(start),
                end_date: Some(end),
                ..Default::default()
            })
            .await?;

        Ok(summarize(&transactions))
    }
}
