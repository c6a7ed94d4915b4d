//! The persisted application record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    PiggyBank, ResultEngine, Settings, Transaction,
    transactions::{format_date, parse_date},
};

/// Everything the app keeps between runs, stored as one JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub settings: Settings,
    pub transactions: Vec<Transaction>,
    pub piggy_bank: PiggyBank,
    /// Watermark: last `YYYY-MM-DD` day already banked by the rollover.
    pub last_processed_date: String,
}

impl AppState {
    /// Fresh state. The watermark starts at `today`, so the first day ever
    /// banked is the day the app was set up.
    pub fn new(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            settings: Settings::new(now),
            transactions: Vec::new(),
            piggy_bank: PiggyBank::default(),
            last_processed_date: format_date(today),
        }
    }

    pub fn validate(&self) -> ResultEngine<()> {
        self.settings.validate()?;
        self.piggy_bank.validate()?;
        parse_date(&self.last_processed_date)?;
        for tx in &self.transactions {
            tx.validate()?;
        }
        Ok(())
    }
}
