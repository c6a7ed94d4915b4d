//! Read-only views over settings and the transaction log: the monthly
//! summary, the view of a single day and the per-day calendar.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    Money, ResultEngine, Settings, Transaction, budget,
    transactions::format_date,
};

/// Budget, spend and savings of one calendar day.
///
/// `savings` is `budget - expenses` and goes negative on overspent days.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub budget: f64,
    pub expenses: f64,
    pub savings: f64,
    pub is_positive: bool,
}

impl DailyStats {
    pub fn new(date: NaiveDate, allowance: Money, spend: Money) -> Self {
        let savings = allowance.diff(spend);
        Self {
            date: format_date(date),
            budget: allowance.value(),
            expenses: spend.value(),
            savings,
            is_positive: savings >= 0.0,
        }
    }
}

/// Spending of the month containing a reference date.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub total_fixed: Money,
    pub total_variable_spent: Money,
    /// `max(0, budget - fixed - variable spend)`.
    pub monthly_remaining: Money,
}

/// Allowance and spend of a single day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DayView {
    pub allowance: Money,
    pub spent: Money,
    /// `allowance - spent`, negative when the day is overspent.
    pub remaining: f64,
}

pub fn month_summary(
    settings: &Settings,
    transactions: &[Transaction],
    reference: NaiveDate,
) -> ResultEngine<MonthSummary> {
    let total_fixed = settings.fixed_total();
    let mut total_variable_spent = Money::ZERO;
    for tx in transactions.iter().filter(|tx| !tx.is_fixed()) {
        let date = tx.day()?;
        if date.year() == reference.year() && date.month() == reference.month() {
            total_variable_spent += tx.amount;
        }
    }

    Ok(MonthSummary {
        total_fixed,
        total_variable_spent,
        monthly_remaining: settings
            .monthly_budget
            .saturating_sub(total_fixed)
            .saturating_sub(total_variable_spent),
    })
}

pub fn day_view(settings: &Settings, transactions: &[Transaction], date: NaiveDate) -> DayView {
    let allowance =
        budget::daily_allowance(settings.monthly_budget, &settings.fixed_expenses, date);
    let spent = budget::variable_spend(transactions, date);
    DayView {
        allowance,
        spent,
        remaining: allowance.diff(spent),
    }
}

/// One [`DailyStats`] per day of the month containing `reference`.
pub fn calendar(
    settings: &Settings,
    transactions: &[Transaction],
    reference: NaiveDate,
) -> Vec<DailyStats> {
    let Some(first) = reference.with_day(1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take(budget::days_in_month(reference) as usize)
        .map(|date| {
            let view = day_view(settings, transactions, date);
            DailyStats::new(date, view.allowance, view.spent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{FixedExpense, Tag};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> Settings {
        let mut settings = Settings::new(Utc::now());
        settings.monthly_budget = Money::from(2000);
        settings.fixed_expenses = vec![FixedExpense::new("rent", Money::from(500)).unwrap()];
        settings.is_onboarded = true;
        settings
    }

    fn tx(date: NaiveDate, amount: u32, tag: Tag) -> Transaction {
        Transaction::new(date, Money::from(amount), vec![tag], None, Utc::now()).unwrap()
    }

    #[test]
    fn month_summary_counts_only_variable_spend_of_the_month() {
        let transactions = vec![
            tx(day(2025, 6, 1), 100, Tag::Optional),
            tx(day(2025, 6, 2), 50, Tag::Necessary),
            tx(day(2025, 6, 3), 500, Tag::Fixed),
            tx(day(2025, 5, 31), 70, Tag::Optional),
        ];
        let summary = month_summary(&settings(), &transactions, day(2025, 6, 15)).unwrap();
        assert_eq!(summary.total_fixed, Money::from(500));
        assert_eq!(summary.total_variable_spent, Money::from(150));
        assert_eq!(summary.monthly_remaining, Money::from(1350));
    }

    #[test]
    fn month_summary_remaining_never_negative() {
        let transactions = vec![tx(day(2025, 6, 1), 5000, Tag::Optional)];
        let summary = month_summary(&settings(), &transactions, day(2025, 6, 15)).unwrap();
        assert_eq!(summary.monthly_remaining, Money::ZERO);
    }

    #[test]
    fn day_view_goes_negative_when_overspent() {
        // 1500 / 30 = 50 per day in June.
        let transactions = vec![tx(day(2025, 6, 4), 80, Tag::Optional)];
        let view = day_view(&settings(), &transactions, day(2025, 6, 4));
        assert_eq!(view.allowance, Money::from(50));
        assert_eq!(view.spent, Money::from(80));
        assert_eq!(view.remaining, -30.0);
    }

    #[test]
    fn calendar_covers_the_whole_month() {
        let transactions = vec![tx(day(2024, 2, 10), 80, Tag::Optional)];
        let days = calendar(&settings(), &transactions, day(2024, 2, 17));
        assert_eq!(days.len(), 29);
        assert_eq!(days[0].date, "2024-02-01");
        assert_eq!(days[28].date, "2024-02-29");
        assert!(!days[9].is_positive);
        assert!(days[10].is_positive);
    }
}
