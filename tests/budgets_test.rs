mod common;

use chrono::{Datelike, Utc};
use common::*;
use conto::application::AppError;
use conto::domain::month_bounds;

#[tokio::test]
async fn test_set_and_list_budgets() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    let budget = service
        .set_budget("Groceries", 40000, 8, 2026)
        .await
        .unwrap();
    assert!(budget.id > 0);
    assert_eq!(budget.amount_cents, 40000);
    assert_eq!((budget.month, budget.year), (8, 2026));
    assert_eq!(budget.period(), month_bounds(2026, 8));

    service.set_budget("Dining", 20000, 8, 2026).await.unwrap();
    service.set_budget("Rent", 90000, 9, 2026).await.unwrap();

    let all = service.list_budgets(None, None).await.unwrap();
    assert_eq!(all.len(), 3);
    // Most recent period first
    assert_eq!(all[0].month, 9);

    let august = service.list_budgets(Some(8), Some(2026)).await.unwrap();
    assert_eq!(august.len(), 2);
}

#[tokio::test]
async fn test_duplicate_budget_rejected() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    service
        .set_budget("Groceries", 40000, 8, 2026)
        .await
        .unwrap();
    let result = service.set_budget("Groceries", 50000, 8, 2026).await;
    assert!(matches!(result, Err(AppError::BudgetAlreadyExists { .. })));

    // Same category, different month is fine
    service
        .set_budget("Groceries", 50000, 9, 2026)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_budget_amount_must_be_positive() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    for amount in [0, -5000] {
        let result = service.set_budget("Groceries", amount, 8, 2026).await;
        assert!(matches!(result, Err(AppError::NonPositiveBudget(_))));
    }
}

#[tokio::test]
async fn test_budget_month_validation() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    for month in [0, 13] {
        let result = service.set_budget("Groceries", 40000, month, 2026).await;
        assert!(matches!(result, Err(AppError::InvalidMonth(_))));
    }
}

#[tokio::test]
async fn test_budget_year_must_be_near_current() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    let current = Utc::now().year();

    let result = service
        .set_budget("Groceries", 40000, 8, current + 6)
        .await;
    assert!(matches!(result, Err(AppError::YearOutOfRange { .. })));

    let result = service
        .set_budget("Groceries", 40000, 8, current - 6)
        .await;
    assert!(matches!(result, Err(AppError::YearOutOfRange { .. })));

    // Boundary years are accepted
    service
        .set_budget("Groceries", 40000, 8, current + 5)
        .await
        .unwrap();
    service
        .set_budget("Dining", 40000, 8, current - 5)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_budget_requires_existing_category() {
    let (service, _tmp) = test_service().await.unwrap();

    let result = service.set_budget("Nonexistent", 40000, 8, 2026).await;
    assert!(matches!(result, Err(AppError::CategoryNotFound(_))));
}

#[tokio::test]
async fn test_delete_budget() {
    let (service, _tmp) = test_service().await.unwrap();
    StandardCategories::create_basic(&service).await.unwrap();

    let budget = service
        .set_budget("Groceries", 40000, 8, 2026)
        .await
        .unwrap();

    let deleted = service.delete_budget(budget.id).await.unwrap();
    assert_eq!(deleted.id, budget.id);

    let result = service.delete_budget(budget.id).await;
    assert!(matches!(result, Err(AppError::BudgetNotFound(_))));
}
