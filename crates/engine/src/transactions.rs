//! Transaction primitives.
//!
//! A `Transaction` is a single logged expense. Its date is kept as the
//! `YYYY-MM-DD` string it was persisted with; the engine matches days by exact
//! string equality and parses the date only to validate it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Storage format of every calendar date handled by the engine.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Necessary,
    Fixed,
    Optional,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Necessary => "necessary",
            Self::Fixed => "fixed",
            Self::Optional => "optional",
        }
    }
}

impl TryFrom<&str> for Tag {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "necessary" => Ok(Self::Necessary),
            "fixed" => Ok(Self::Fixed),
            "optional" => Ok(Self::Optional),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid tag: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub amount: Money,
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        amount: Money,
        tags: Vec<Tag>,
        note: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let mut deduped: Vec<Tag> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !deduped.contains(&tag) {
                deduped.push(tag);
            }
        }
        let tx = Self {
            id: Uuid::new_v4().to_string(),
            date: format_date(date),
            amount,
            tags: deduped,
            note: note
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            created_at,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// `true` when the transaction is a pre-planned fixed expense, which does
    /// not consume the daily allowance.
    pub fn is_fixed(&self) -> bool {
        self.tags.contains(&Tag::Fixed)
    }

    /// Parsed calendar day.
    pub fn day(&self) -> ResultEngine<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn validate(&self) -> ResultEngine<()> {
        if self.tags.is_empty() {
            return Err(EngineError::InvalidTransaction(format!(
                "transaction {} has no tags",
                self.id
            )));
        }
        self.day()?;
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// Only the canonical form is accepted: spending is matched by exact string
/// equality, so `2025-6-8` or a padded value would never match its day.
pub fn parse_date(value: &str) -> ResultEngine<NaiveDate> {
    let invalid = || EngineError::InvalidDate(format!("'{value}' is not a YYYY-MM-DD date"));
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
    if format_date(date) != value {
        return Err(invalid());
    }
    Ok(date)
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
