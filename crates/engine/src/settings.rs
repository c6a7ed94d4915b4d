//! User budget settings.
//!
//! The monthly budget is the whole amount the user plans to spend in a month.
//! Fixed expenses (rent, subscriptions, ...) are pre-deducted from it before
//! the daily discretionary allowance is computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// A recurring monthly cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub id: String,
    pub label: String,
    pub amount: Money,
}

impl FixedExpense {
    pub fn new(label: &str, amount: Money) -> ResultEngine<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Err(EngineError::InvalidSettings(
                "fixed expense label must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            amount,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub monthly_budget: Money,
    pub fixed_expenses: Vec<FixedExpense>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Remote mirror environment. Empty or missing disables mirroring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_env_id: Option<String>,
}

impl Settings {
    /// Settings of a user that has not completed onboarding yet.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            monthly_budget: Money::ZERO,
            fixed_expenses: Vec::new(),
            is_onboarded: false,
            created_at: now,
            updated_at: now,
            cloud_env_id: None,
        }
    }

    /// Sum of all fixed expenses.
    pub fn fixed_total(&self) -> Money {
        self.fixed_expenses.iter().map(|e| e.amount).sum()
    }

    /// Remote environment id, if mirroring is enabled.
    pub fn cloud_env(&self) -> Option<&str> {
        self.cloud_env_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Checks invariants that serde alone cannot express.
    ///
    /// Amounts are already `>= 0` by construction of [`Money`]; what is left is
    /// unique, non-empty fixed expense ids.
    pub fn validate(&self) -> ResultEngine<()> {
        for (idx, expense) in self.fixed_expenses.iter().enumerate() {
            if expense.id.trim().is_empty() {
                return Err(EngineError::InvalidSettings(format!(
                    "fixed expense '{}' has an empty id",
                    expense.label
                )));
            }
            if self.fixed_expenses[..idx].iter().any(|e| e.id == expense.id) {
                return Err(EngineError::InvalidSettings(format!(
                    "duplicated fixed expense id '{}'",
                    expense.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(id: &str, amount: u32) -> FixedExpense {
        FixedExpense {
            id: id.to_string(),
            label: format!("expense {id}"),
            amount: Money::from(amount),
        }
    }

    #[test]
    fn fixed_total_sums_all_expenses() {
        let mut settings = Settings::new(Utc::now());
        settings.fixed_expenses = vec![expense("1", 500), expense("2", 120)];
        assert_eq!(settings.fixed_total(), Money::from(620));
    }

    #[test]
    fn cloud_env_ignores_blank() {
        let mut settings = Settings::new(Utc::now());
        assert_eq!(settings.cloud_env(), None);
        settings.cloud_env_id = Some("  ".to_string());
        assert_eq!(settings.cloud_env(), None);
        settings.cloud_env_id = Some("env-1".to_string());
        assert_eq!(settings.cloud_env(), Some("env-1"));
    }

    #[test]
    fn validate_rejects_duplicated_ids() {
        let mut settings = Settings::new(Utc::now());
        settings.fixed_expenses = vec![expense("1", 500), expense("1", 120)];
        assert_eq!(
            settings.validate(),
            Err(EngineError::InvalidSettings(
                "duplicated fixed expense id '1'".to_string()
            ))
        );
    }

    #[test]
    #[should_panic(expected = "InvalidSettings(\"fixed expense label must not be empty\")")]
    fn fail_blank_label() {
        FixedExpense::new("   ", Money::from(10)).unwrap();
    }

    #[test]
    fn deserialize_camel_case() {
        let json = r#"{
            "monthlyBudget": 3000,
            "fixedExpenses": [{"id": "1", "label": "Rent", "amount": 1000}],
            "isOnboarded": true,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.is_onboarded);
        assert_eq!(settings.monthly_budget, Money::from(3000));
        assert_eq!(settings.fixed_total(), Money::from(1000));
        assert_eq!(settings.cloud_env_id, None);
    }
}
