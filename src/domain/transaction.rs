use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, CategoryId};

pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(format!("unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded money movement. The amount is always a positive
/// magnitude; direction is conveyed by the transaction type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Database-assigned identifier; 0 until persisted.
    pub id: TransactionId,
    /// None means "uncategorized"
    pub category: Option<CategoryId>,
    pub amount_cents: Cents,
    pub description: String,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction. The id is assigned by the repository on save.
    pub fn new(
        amount_cents: Cents,
        description: impl Into<String>,
        date: NaiveDate,
        transaction_type: TransactionType,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: 0,
            category: None,
            amount_cents,
            description: description.into(),
            date,
            transaction_type,
            created_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn test_create_transaction() {
        let tx = Transaction::new(5000, "Groceries run", sample_date(), TransactionType::Expense)
            .with_category(3);

        assert_eq!(tx.amount_cents, 5000);
        assert_eq!(tx.category, Some(3));
        assert_eq!(tx.description, "Groceries run");
        assert!(tx.is_expense());
        assert!(!tx.is_income());
    }

    #[test]
    fn test_transaction_type_roundtrip() {
        for tt in [
            TransactionType::Income,
            TransactionType::Expense,
            TransactionType::Transfer,
        ] {
            let parsed: TransactionType = tt.as_str().parse().unwrap();
            assert_eq!(tt, parsed);
        }
    }

    #[test]
    fn test_transaction_type_parse_invalid() {
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        Transaction::new(0, "Nothing", sample_date(), TransactionType::Expense);
    }
}
