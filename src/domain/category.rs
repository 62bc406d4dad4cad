use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

/// A user-defined label used to group both transactions and budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Database-assigned identifier; 0 until persisted.
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category. The id is assigned by the repository on save.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
