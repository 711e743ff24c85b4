//! Domain models for Penny

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction category
///
/// The four named categories are the only ones the store accepts. `Other`
/// exists for model suggestions that don't fit the fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Salary,
    Carryover,
    Groceries,
    EatingOut,
    Other,
}

impl Category {
    /// Categories a transaction can be stored with
    pub const STORABLE: [Category; 4] = [
        Category::Salary,
        Category::Carryover,
        Category::Groceries,
        Category::EatingOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salary => "salary",
            Self::Carryover => "carryover",
            Self::Groceries => "groceries",
            Self::EatingOut => "eating_out",
            Self::Other => "other",
        }
    }

    pub fn is_storable(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "salary" => Ok(Self::Salary),
            "carryover" => Ok(Self::Carryover),
            "groceries" => Ok(Self::Groceries),
            "eating_out" | "eating out" => Ok(Self::EatingOut),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Category,
    /// Non-negative, two fraction digits
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Payload for creating a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Category,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TransactionUpdate {
    /// Apply the present fields onto an existing row
    pub fn apply(&self, tx: &mut Transaction) {
        if let Some(date) = self.date {
            tx.date = date;
        }
        if let Some(kind) = self.kind {
            tx.kind = kind;
        }
        if let Some(category) = self.category {
            tx.category = category;
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(ref description) = self.description {
            tx.description = Some(description.clone());
        }
    }
}

/// Month totals as served by the summary endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

/// A suggested classification for a free-text description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub suggested_type: TransactionKind,
    pub suggested_category: Category,
    pub confidence: f64,
}

impl CategorySuggestion {
    /// Returned whenever the model can't be reached or its reply can't be used
    pub fn fallback() -> Self {
        Self {
            suggested_type: TransactionKind::Expense,
            suggested_category: Category::Other,
            confidence: 0.1,
        }
    }
}

/// Where a report's narrative text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    /// Text generated by the model
    Model,
    /// Deterministic paragraph built from the statistics
    Fallback,
    /// The month had no transactions
    NoData,
}

impl NarrativeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Fallback => "fallback",
            Self::NoData => "no_data",
        }
    }
}

/// Generated monthly report; never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: String,
    pub report_text: String,
    pub insights: Vec<String>,
    pub transaction_count: usize,
    pub narrative_source: NarrativeSource,
}
