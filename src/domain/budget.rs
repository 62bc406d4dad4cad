use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, CategoryId};

pub type BudgetId = i64;

/// A planned spending ceiling for one category within one calendar month.
/// Budgets are always categorized; uncategorized expenses count against no budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Database-assigned identifier; 0 until persisted.
    pub id: BudgetId,
    pub category: CategoryId,
    pub amount_cents: Cents,
    /// 1-12
    pub month: u32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new budget. The id is assigned by the repository on save.
    pub fn new(category: CategoryId, amount_cents: Cents, month: u32, year: i32) -> Self {
        assert!((1..=12).contains(&month), "Month must be between 1 and 12");
        Self {
            id: 0,
            category,
            amount_cents,
            month,
            year,
            created_at: Utc::now(),
        }
    }

    /// First and last day of this budget's month, inclusive.
    pub fn period(&self) -> (NaiveDate, NaiveDate) {
        month_bounds(self.year, self.month)
    }
}

/// English name for a month number (1-12).
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// First and last day of a calendar month, inclusive.
pub fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    assert!((1..=12).contains(&month), "Month must be between 1 and 12");
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    (start, next_month - Duration::days(1))
}

/// The (month, year) pair for the current date.
pub fn current_month() -> (u32, i32) {
    let today = Utc::now().date_naive();
    (today.month(), today.year())
}
