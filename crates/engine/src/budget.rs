//! Budget arithmetic: the daily discretionary allowance and the variable spend
//! of a day.

use chrono::{Datelike, NaiveDate};

use crate::{FixedExpense, Money, Transaction, transactions::format_date};

/// Number of days (28..=31) in the calendar month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Discretionary amount available for one day of the month containing
/// `reference_date`.
///
/// `max(0, monthly_budget - sum(fixed_expenses)) / days_in_month`.
pub fn daily_allowance(
    monthly_budget: Money,
    fixed_expenses: &[FixedExpense],
    reference_date: NaiveDate,
) -> Money {
    let fixed_total: Money = fixed_expenses.iter().map(|e| e.amount).sum();
    monthly_budget
        .saturating_sub(fixed_total)
        .split(days_in_month(reference_date))
}

/// Total of the transactions logged on `date` that consume the daily
/// allowance, i.e. every transaction not tagged `fixed`.
pub fn variable_spend(transactions: &[Transaction], date: NaiveDate) -> Money {
    let key = format_date(date);
    transactions
        .iter()
        .filter(|tx| tx.date == key && !tx.is_fixed())
        .map(|tx| tx.amount)
        .sum()
}
