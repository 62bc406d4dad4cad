use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Budget, BudgetId, Cents, CategoryId, Transaction, format_cents, month_name};

/// Planned vs. actual spending for one budget, recomputed on demand and never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: BudgetId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub budget_amount: Cents,
    pub actual_spending: Cents,
    /// budget_amount - actual_spending; negative when overspent
    pub remaining_amount: Cents,
    /// Uncapped: 106.67 means 6.67% over. 0.0 for a zero-amount budget.
    pub spending_percentage: f64,
    pub is_over_budget: bool,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Danger,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A threshold-triggered notice derived from a BudgetProgress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub level: AlertLevel,
    pub category_name: String,
    pub message: String,
}

/// Merge budgets and transactions into progress records.
///
/// Returns one entry per input budget, in input order; budgets sharing a
/// category each get their own independently computed entry. Only Expense
/// transactions count toward spending. The caller is responsible for scoping
/// the transaction list to the budgets' month; no date filtering happens here.
pub fn compute_budget_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    category_names: &HashMap<CategoryId, String>,
) -> Vec<BudgetProgress> {
    let expenses: Vec<&Transaction> = transactions.iter().filter(|t| t.is_expense()).collect();

    budgets
        .iter()
        .map(|budget| {
            let actual_spending: Cents = expenses
                .iter()
                .filter(|t| t.category == Some(budget.category))
                .map(|t| t.amount_cents)
                .sum();

            // Zero-amount budgets read as "no progress" rather than
            // infinitely over.
            let spending_percentage = if budget.amount_cents > 0 {
                (actual_spending as f64 / budget.amount_cents as f64) * 100.0
            } else {
                0.0
            };

            BudgetProgress {
                budget_id: budget.id,
                category_id: budget.category,
                category_name: category_names
                    .get(&budget.category)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                budget_amount: budget.amount_cents,
                actual_spending,
                remaining_amount: budget.amount_cents - actual_spending,
                spending_percentage,
                is_over_budget: spending_percentage > 100.0,
                month: budget.month,
                year: budget.year,
            }
        })
        .collect()
}

/// Derive threshold alerts from progress records.
///
/// At or above 100% produces a single danger alert; the 80% warning never
/// fires for the same budget.
pub fn budget_alerts(progress: &[BudgetProgress]) -> Vec<BudgetAlert> {
    progress
        .iter()
        .filter_map(|p| {
            if p.spending_percentage >= 100.0 {
                Some(BudgetAlert {
                    level: AlertLevel::Danger,
                    category_name: p.category_name.clone(),
                    message: format!(
                        "Budget for {} exceeded in {} {}: spent {} of {}",
                        p.category_name,
                        month_name(p.month),
                        p.year,
                        format_cents(p.actual_spending),
                        format_cents(p.budget_amount),
                    ),
                })
            } else if p.spending_percentage >= 80.0 {
                Some(BudgetAlert {
                    level: AlertLevel::Warning,
                    category_name: p.category_name.clone(),
                    message: format!(
                        "{} budget at {:.1}% ({} of {})",
                        p.category_name,
                        p.spending_percentage,
                        format_cents(p.actual_spending),
                        format_cents(p.budget_amount),
                    ),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Income/expense/net totals over a transaction set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthSummary {
    pub income: Cents,
    pub expenses: Cents,
    pub net: Cents,
}

/// Sum income and expense magnitudes; transfers are neutral and ignored.
pub fn summarize(transactions: &[Transaction]) -> MonthSummary {
    let income: Cents = transactions
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount_cents)
        .sum();
    let expenses: Cents = transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount_cents)
        .sum();

    MonthSummary {
        income,
        expenses,
        net: income - expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionType;
    use chrono::NaiveDate;

    fn names() -> HashMap<CategoryId, String> {
        HashMap::from([
            (2, "Groceries".to_string()),
            (3, "Dining".to_string()),
            (5, "Utilities".to_string()),
        ])
    }

    fn tx(category: Option<CategoryId>, amount: Cents, tt: TransactionType) -> Transaction {
        let mut t = Transaction::new(
            amount,
            "test",
            NaiveDate::from_ymd_opt(2025, 9, 10).unwrap(),
            tt,
        );
        t.category = category;
        t
    }

    fn budget(id: BudgetId, category: CategoryId, amount: Cents) -> Budget {
        let mut b = Budget::new(category, amount, 9, 2025);
        b.id = id;
        b
    }

    #[test]
    fn test_one_entry_per_budget_in_input_order() {
        let budgets = vec![budget(1, 2, 30000), budget(2, 3, 10000), budget(3, 5, 5000)];
        let progress = compute_budget_progress(&budgets, &[], &names());

        assert_eq!(progress.len(), 3);
        assert_eq!(progress[0].budget_id, 1);
        assert_eq!(progress[1].budget_id, 2);
        assert_eq!(progress[2].budget_id, 3);
    }

    #[test]
    fn test_sums_matching_expenses_only() {
        let budgets = vec![budget(1, 2, 30000)];
        let transactions = vec![
            tx(Some(2), 15000, TransactionType::Expense),
            tx(Some(2), 12000, TransactionType::Expense),
            tx(Some(3), 99900, TransactionType::Expense), // other category
            tx(None, 4000, TransactionType::Expense),     // uncategorized
        ];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].actual_spending, 27000);
    }

    #[test]
    fn test_income_and_transfers_never_count() {
        let budgets = vec![budget(1, 2, 30000)];
        let base = vec![tx(Some(2), 15000, TransactionType::Expense)];
        let with_noise = vec![
            tx(Some(2), 15000, TransactionType::Expense),
            tx(Some(2), 5_000_000, TransactionType::Income),
            tx(Some(2), 5_000_000, TransactionType::Transfer),
        ];

        let before = compute_budget_progress(&budgets, &base, &names());
        let after = compute_budget_progress(&budgets, &with_noise, &names());
        assert_eq!(before[0].actual_spending, after[0].actual_spending);
    }

    #[test]
    fn test_zero_amount_budget_clamps_percentage() {
        let budgets = vec![budget(1, 5, 0)];
        let transactions = vec![tx(Some(5), 5000, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].spending_percentage, 0.0);
        assert!(progress[0].spending_percentage.is_finite());
        assert!(!progress[0].is_over_budget);
        assert_eq!(progress[0].remaining_amount, -5000);
    }

    #[test]
    fn test_overrun_percentage_is_uncapped() {
        let budgets = vec![budget(1, 2, 10000)];
        let transactions = vec![tx(Some(2), 15000, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].spending_percentage, 150.0);
        assert!(progress[0].is_over_budget);
    }

    #[test]
    fn test_remaining_is_budget_minus_spending() {
        let budgets = vec![budget(1, 2, 30000), budget(2, 3, 10000)];
        let transactions = vec![
            tx(Some(2), 27000, TransactionType::Expense),
            tx(Some(3), 12500, TransactionType::Expense),
        ];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        for p in &progress {
            assert_eq!(p.remaining_amount, p.budget_amount - p.actual_spending);
        }
        assert_eq!(progress[0].remaining_amount, 3000);
        assert_eq!(progress[1].remaining_amount, -2500);
    }

    #[test]
    fn test_no_matching_transactions() {
        let budgets = vec![budget(1, 5, 10000)];
        let transactions = vec![tx(Some(2), 5000, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].actual_spending, 0);
        assert_eq!(progress[0].remaining_amount, 10000);
        assert_eq!(progress[0].spending_percentage, 0.0);
        assert!(!progress[0].is_over_budget);
    }

    #[test]
    fn test_duplicate_category_budgets_computed_independently() {
        let budgets = vec![budget(1, 3, 20000), budget(2, 3, 20000)];
        let transactions = vec![
            tx(Some(3), 7000, TransactionType::Expense),
            tx(Some(3), 3000, TransactionType::Expense),
        ];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].actual_spending, 10000);
        assert_eq!(progress[1].actual_spending, 10000);
        assert_eq!(progress[0].remaining_amount, progress[1].remaining_amount);
    }

    #[test]
    fn test_unknown_category_name_falls_back() {
        let budgets = vec![budget(1, 42, 10000)];
        let progress = compute_budget_progress(&budgets, &[], &names());
        assert_eq!(progress[0].category_name, "Unknown");
    }

    // Scenario from the dashboard: 300.00 budget, expenses 150.00 + 120.00
    // plus an income that must not count.
    #[test]
    fn test_warning_scenario() {
        let budgets = vec![budget(1, 2, 30000)];
        let transactions = vec![
            tx(Some(2), 15000, TransactionType::Expense),
            tx(Some(2), 12000, TransactionType::Expense),
            tx(Some(2), 50000, TransactionType::Income),
        ];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].actual_spending, 27000);
        assert_eq!(progress[0].remaining_amount, 3000);
        assert!((progress[0].spending_percentage - 90.0).abs() < 1e-9);
        assert!(!progress[0].is_over_budget);

        let alerts = budget_alerts(&progress);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert!(alerts[0].message.contains("90.0%"));
    }

    #[test]
    fn test_danger_scenario() {
        let budgets = vec![budget(1, 2, 30000)];
        let transactions = vec![
            tx(Some(2), 15000, TransactionType::Expense),
            tx(Some(2), 12000, TransactionType::Expense),
            tx(Some(2), 5000, TransactionType::Expense),
        ];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].actual_spending, 32000);
        assert_eq!(progress[0].remaining_amount, -2000);
        assert!((progress[0].spending_percentage - 106.666_666_666_666_67).abs() < 1e-9);
        assert!(progress[0].is_over_budget);

        let alerts = budget_alerts(&progress);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Danger);
    }

    #[test]
    fn test_exactly_100_percent_is_danger_not_warning() {
        let budgets = vec![budget(1, 2, 10000)];
        let transactions = vec![tx(Some(2), 10000, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].spending_percentage, 100.0);
        // > 100, not >= 100: exactly on the limit is not "over"
        assert!(!progress[0].is_over_budget);

        let alerts = budget_alerts(&progress);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Danger);
    }

    #[test]
    fn test_over_105_percent_yields_single_danger_alert() {
        let budgets = vec![budget(1, 2, 10000)];
        let transactions = vec![tx(Some(2), 10500, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert_eq!(progress[0].spending_percentage, 105.0);

        let alerts = budget_alerts(&progress);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Danger);
    }

    #[test]
    fn test_below_80_percent_yields_no_alert() {
        let budgets = vec![budget(1, 2, 10000)];
        let transactions = vec![tx(Some(2), 7999, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        assert!(budget_alerts(&progress).is_empty());
    }

    #[test]
    fn test_exactly_80_percent_warns() {
        let budgets = vec![budget(1, 2, 10000)];
        let transactions = vec![tx(Some(2), 8000, TransactionType::Expense)];

        let progress = compute_budget_progress(&budgets, &transactions, &names());
        let alerts = budget_alerts(&progress);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert!(alerts[0].message.contains("80.0%"));
    }

    #[test]
    fn test_summarize() {
        let transactions = vec![
            tx(None, 250000, TransactionType::Income),
            tx(Some(2), 30000, TransactionType::Expense),
            tx(Some(3), 20000, TransactionType::Expense),
            tx(None, 100000, TransactionType::Transfer),
        ];

        let summary = summarize(&transactions);
        assert_eq!(summary.income, 250000);
        assert_eq!(summary.expenses, 50000);
        assert_eq!(summary.net, 200000);
    }
}
