use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Budget, BudgetId, Category, CategoryId, Cents, Transaction, TransactionId, TransactionType,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_BUDGETS};

/// Repository for persisting and querying categories, transactions and budgets.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_BUDGETS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Category operations
    // ========================

    /// Save a new category, assigning its id.
    pub async fn save_category(&self, category: &mut Category) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, created_at)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(&category.name)
        .bind(category.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save category")?;

        category.id = row.get("id");
        Ok(())
    }

    /// Get a category by id.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a category by name.
    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    /// List all categories ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    /// Delete a category. Transactions keep existing as uncategorized;
    /// budgets for the category are removed.
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        sqlx::query("UPDATE transactions SET category_id = NULL WHERE category_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to detach transactions from category")?;

        sqlx::query("DELETE FROM budgets WHERE category_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete budgets for category")?;

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;

        Ok(())
    }

    fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
        let created_at_str: String = row.get("created_at");

        Ok(Category {
            id: row.get("id"),
            name: row.get("name"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Save a new transaction, assigning its id.
    pub async fn save_transaction(&self, transaction: &mut Transaction) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (category_id, amount_cents, description, date, transaction_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(transaction.category)
        .bind(transaction.amount_cents)
        .bind(&transaction.description)
        .bind(transaction.date.format("%Y-%m-%d").to_string())
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save transaction")?;

        transaction.id = row.get("id");
        Ok(())
    }

    /// Get a transaction by id.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, description, date, transaction_type, created_at
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    /// List transactions with optional filters, most recent first.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_transactions_filtered(
        &self,
        category: Option<CategoryId>,
        transaction_type: Option<TransactionType>,
        min_amount: Option<Cents>,
        max_amount: Option<Cents>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        // Build query dynamically based on filters
        let mut query = String::from(
            "SELECT id, category_id, amount_cents, description, date, transaction_type, created_at FROM transactions WHERE 1=1",
        );

        // Collect string bindings first so they live long enough
        let type_str = transaction_type.map(|tt| tt.as_str().to_string());
        let start_str = start_date.map(|d| d.format("%Y-%m-%d").to_string());
        let end_str = end_date.map(|d| d.format("%Y-%m-%d").to_string());

        if category.is_some() {
            query.push_str(" AND category_id = ?");
        }
        if type_str.is_some() {
            query.push_str(" AND transaction_type = ?");
        }
        if min_amount.is_some() {
            query.push_str(" AND amount_cents >= ?");
        }
        if max_amount.is_some() {
            query.push_str(" AND amount_cents <= ?");
        }
        if start_str.is_some() {
            query.push_str(" AND date >= ?");
        }
        if end_str.is_some() {
            query.push_str(" AND date <= ?");
        }

        query.push_str(" ORDER BY date DESC, id DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);

        if let Some(cat) = category {
            sql_query = sql_query.bind(cat);
        }
        if let Some(ref tt) = type_str {
            sql_query = sql_query.bind(tt);
        }
        if let Some(min) = min_amount {
            sql_query = sql_query.bind(min);
        }
        if let Some(max) = max_amount {
            sql_query = sql_query.bind(max);
        }
        if let Some(ref start) = start_str {
            sql_query = sql_query.bind(start);
        }
        if let Some(ref end) = end_str {
            sql_query = sql_query.bind(end);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Delete a transaction by id.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<()> {
        sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(())
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let date_str: String = row.get("date");
        let type_str: String = row.get("transaction_type");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: row.get("id"),
            category: row.get("category_id"),
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").context("Invalid date")?,
            transaction_type: type_str
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid transaction type: {}", e))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Budget operations
    // ========================

    /// Save a new budget, assigning its id.
    pub async fn save_budget(&self, budget: &mut Budget) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO budgets (category_id, amount_cents, month, year, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(budget.category)
        .bind(budget.amount_cents)
        .bind(budget.month)
        .bind(budget.year)
        .bind(budget.created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save budget")?;

        budget.id = row.get("id");
        Ok(())
    }

    /// Get a budget by id.
    pub async fn get_budget(&self, id: BudgetId) -> Result<Option<Budget>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, month, year, created_at
            FROM budgets
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_budget(&row)?)),
            None => Ok(None),
        }
    }

    /// Find the budget for a (category, month, year) triple, if any.
    pub async fn find_budget(
        &self,
        category: CategoryId,
        month: u32,
        year: i32,
    ) -> Result<Option<Budget>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, amount_cents, month, year, created_at
            FROM budgets
            WHERE category_id = ? AND month = ? AND year = ?
            "#,
        )
        .bind(category)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find budget")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_budget(&row)?)),
            None => Ok(None),
        }
    }

    /// List budgets, optionally narrowed by month and/or year.
    /// Most recent period first.
    pub async fn list_budgets_filtered(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<Budget>> {
        let mut query = String::from(
            "SELECT id, category_id, amount_cents, month, year, created_at FROM budgets WHERE 1=1",
        );

        if month.is_some() {
            query.push_str(" AND month = ?");
        }
        if year.is_some() {
            query.push_str(" AND year = ?");
        }

        query.push_str(" ORDER BY year DESC, month DESC, id");

        let mut sql_query = sqlx::query(&query);

        if let Some(m) = month {
            sql_query = sql_query.bind(m);
        }
        if let Some(y) = year {
            sql_query = sql_query.bind(y);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list budgets")?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    /// Delete a budget by id.
    pub async fn delete_budget(&self, id: BudgetId) -> Result<()> {
        sqlx::query("DELETE FROM budgets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete budget")?;
        Ok(())
    }

    fn row_to_budget(row: &sqlx::sqlite::SqliteRow) -> Result<Budget> {
        let created_at_str: String = row.get("created_at");

        Ok(Budget {
            id: row.get("id"),
            category: row.get("category_id"),
            amount_cents: row.get("amount_cents"),
            month: row.get::<i64, _>("month") as u32,
            year: row.get::<i64, _>("year") as i32,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
