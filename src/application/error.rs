use thiserror::Error;

use crate::domain::{CategoryId, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category already exists: {0}")]
    CategoryAlreadyExists(String),

    #[error("Category name must be at least 2 characters long")]
    InvalidCategoryName,

    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    #[error("Description must be at least 2 characters long")]
    InvalidDescription,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Budget not found: {0}")]
    BudgetNotFound(i64),

    #[error("A budget for category {category} in {month}/{year} already exists")]
    BudgetAlreadyExists {
        category: CategoryId,
        month: u32,
        year: i32,
    },

    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("Year {year} must be within 5 years of the current year ({current})")]
    YearOutOfRange { year: i32, current: i32 },

    #[error("Budget amount must be greater than zero, got {0}")]
    NonPositiveBudget(Cents),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
