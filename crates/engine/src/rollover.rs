//! Day rollover: the catch-up replay of every day between the watermark and
//! yesterday.
//!
//! The watermark (`lastProcessedDate`) is the last day whose savings are
//! already in the piggy bank. Replaying a day twice would bank its savings
//! twice, so the watermark check is what keeps [`rollover`] idempotent.
//!
//! The replay never touches today: today's spending is still in progress, so
//! the watermark is always left at yesterday.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    DailyStats, Money, PiggyBank, ResultEngine, Settings, Transaction, budget,
    transactions::{format_date, parse_date},
};

/// Result of a successful replay.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollover {
    pub piggy_bank: PiggyBank,
    /// New watermark, always `today - 1`.
    pub last_processed_date: String,
    /// One entry per replayed day, in chronological order.
    pub days: Vec<DailyStats>,
}

impl Rollover {
    /// Total banked across the replayed days.
    pub fn banked(&self) -> Money {
        self.days
            .iter()
            .map(|day| Money::new(day.savings.max(0.0)).unwrap_or(Money::ZERO))
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RolloverOutcome {
    /// No budget configured yet; nothing to replay.
    NotOnboarded,
    /// Less than one full day between the watermark and today.
    UpToDate,
    Applied(Rollover),
}

/// Replays every day strictly between `watermark` and `today`.
///
/// For each day, in order, the surplus `max(0, allowance - spend)` is added to
/// the piggy bank. Overspending a day never takes money out.
///
/// # Errors
/// - [`EngineError::InvalidDate`] when `watermark` or any transaction date does
///   not parse. Nothing is replayed in that case.
///
/// [`EngineError::InvalidDate`]: crate::EngineError::InvalidDate
pub fn rollover(
    settings: &Settings,
    transactions: &[Transaction],
    piggy_bank: &PiggyBank,
    watermark: &str,
    today: NaiveDate,
) -> ResultEngine<RolloverOutcome> {
    if !settings.is_onboarded {
        return Ok(RolloverOutcome::NotOnboarded);
    }

    let last_processed = parse_date(watermark)?;
    if (today - last_processed).num_days() <= 1 {
        return Ok(RolloverOutcome::UpToDate);
    }

    // A malformed date would silently drop a day's spending from the replay.
    for tx in transactions {
        tx.day()?;
    }

    let mut bank = piggy_bank.clone();
    let mut days = Vec::new();
    let mut cursor = last_processed.succ_opt();

    while let Some(day) = cursor
        && day < today
    {
        let allowance = budget::daily_allowance(
            settings.monthly_budget,
            &settings.fixed_expenses,
            day,
        );
        let spend = budget::variable_spend(transactions, day);
        let savings = allowance.saturating_sub(spend);

        let next = bank.apply_increment(savings);
        if next.capacity_level != bank.capacity_level {
            info!(
                "piggy bank upgraded on {day}: capacity {} -> {}",
                bank.capacity_level, next.capacity_level
            );
            bank = PiggyBank {
                last_upgraded_at: Some(day),
                ..next
            };
        } else {
            bank = next;
        }

        debug!("rollover {day}: allowance {allowance}, spent {spend}, banked {savings}");
        days.push(DailyStats::new(day, allowance, spend));
        cursor = day.succ_opt();
    }

    let yesterday = today.pred_opt().unwrap_or(today);
    Ok(RolloverOutcome::Applied(Rollover {
        piggy_bank: bank,
        last_processed_date: format_date(yesterday),
        days,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};

    use super::*;
    use crate::{EngineError, FixedExpense, Tag};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn onboarded(budget: u32) -> Settings {
        let mut settings = Settings::new(Utc::now());
        settings.monthly_budget = Money::from(budget);
        settings.is_onboarded = true;
        settings
    }

    fn tx(date: NaiveDate, amount: u32, tag: Tag) -> Transaction {
        Transaction::new(date, Money::from(amount), vec![tag], None, Utc::now()).unwrap()
    }

    fn applied(outcome: RolloverOutcome) -> Rollover {
        match outcome {
            RolloverOutcome::Applied(rollover) => rollover,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    // June has 30 days: a 300 budget gives 10 per day.
    const TODAY: (i32, u32, u32) = (2025, 6, 20);

    fn today() -> NaiveDate {
        day(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn not_onboarded_is_skipped() {
        let mut settings = onboarded(300);
        settings.is_onboarded = false;
        let outcome =
            rollover(&settings, &[], &PiggyBank::default(), "2025-06-01", today()).unwrap();
        assert_eq!(outcome, RolloverOutcome::NotOnboarded);
    }

    #[test]
    fn same_day_and_yesterday_are_up_to_date() {
        let settings = onboarded(300);
        for watermark in ["2025-06-20", "2025-06-19", "2025-06-25"] {
            let outcome =
                rollover(&settings, &[], &PiggyBank::default(), watermark, today()).unwrap();
            assert_eq!(outcome, RolloverOutcome::UpToDate, "watermark {watermark}");
        }
    }

    #[test]
    fn replays_two_days() {
        let settings = onboarded(300);
        let result = applied(
            rollover(&settings, &[], &PiggyBank::default(), "2025-06-17", today()).unwrap(),
        );
        assert_eq!(result.piggy_bank.current_amount, Money::from(20));
        assert_eq!(result.last_processed_date, "2025-06-19");
        assert_eq!(result.days.len(), 2);
        assert_eq!(result.days[0].date, "2025-06-18");
        assert_eq!(result.days[1].date, "2025-06-19");
        assert_eq!(result.banked(), Money::from(20));
    }

    #[test]
    fn overspend_banks_nothing() {
        let settings = onboarded(300);
        let transactions = vec![tx(day(2025, 6, 18), 15, Tag::Optional)];
        let result = applied(
            rollover(
                &settings,
                &transactions,
                &PiggyBank::default(),
                "2025-06-17",
                day(2025, 6, 19),
            )
            .unwrap(),
        );
        assert_eq!(result.piggy_bank, PiggyBank::default());
        assert_eq!(result.days[0].savings, -5.0);
        assert!(!result.days[0].is_positive);
    }

    #[test]
    fn fixed_transactions_do_not_consume_allowance() {
        let settings = onboarded(300);
        let transactions = vec![tx(day(2025, 6, 18), 500, Tag::Fixed)];
        let result = applied(
            rollover(
                &settings,
                &transactions,
                &PiggyBank::default(),
                "2025-06-17",
                day(2025, 6, 19),
            )
            .unwrap(),
        );
        assert_eq!(result.piggy_bank.current_amount, Money::from(10));
    }

    #[test]
    fn upgrade_records_the_day() {
        let settings = onboarded(300);
        let result = applied(
            rollover(&settings, &[], &PiggyBank::default(), "2025-06-10", today()).unwrap(),
        );
        // 9 days * 10 = 90: tier 30 and tier 50 overflow, 10 left at tier 100.
        assert_eq!(result.piggy_bank.capacity_level, 100);
        assert_eq!(result.piggy_bank.current_amount, Money::from(10));
        assert_eq!(result.piggy_bank.total_saved_history, Money::from(80));
        assert_eq!(result.piggy_bank.last_upgraded_at, Some(day(2025, 6, 18)));
    }

    #[test]
    fn allowance_follows_each_replayed_month() {
        let mut settings = onboarded(0);
        settings.monthly_budget = Money::from(3100);
        settings.fixed_expenses = vec![FixedExpense::new("rent", Money::from(1000)).unwrap()];
        let result = applied(
            rollover(
                &settings,
                &[],
                &PiggyBank::default(),
                "2025-05-30",
                day(2025, 6, 2),
            )
            .unwrap(),
        );
        // May 31 uses 31 days, June 1 uses 30.
        assert_eq!(result.days.len(), 2);
        assert!((result.days[0].budget - 2100.0 / 31.0).abs() < 1e-9);
        assert!((result.days[1].budget - 2100.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn long_absence_is_fully_replayed() {
        let settings = onboarded(300);
        let watermark = today().checked_sub_days(Days::new(400)).unwrap();
        let result = applied(
            rollover(
                &settings,
                &[],
                &PiggyBank::default(),
                &format_date(watermark),
                today(),
            )
            .unwrap(),
        );
        assert_eq!(result.days.len(), 399);
        assert_eq!(result.last_processed_date, "2025-06-19");
        assert!(result.piggy_bank.total_saved_history.value() > 0.0);
    }

    #[test]
    fn malformed_watermark_is_an_error() {
        let settings = onboarded(300);
        let err = rollover(&settings, &[], &PiggyBank::default(), "yesterday", today())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidDate("'yesterday' is not a YYYY-MM-DD date".to_string())
        );
    }

    #[test]
    fn malformed_transaction_date_is_an_error() {
        let settings = onboarded(300);
        let mut bad = tx(day(2025, 6, 18), 5, Tag::Optional);
        bad.date = "18/06/2025".to_string();
        let err = rollover(
            &settings,
            &[bad],
            &PiggyBank::default(),
            "2025-06-17",
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDate(_)));
    }

    #[test]
    fn non_canonical_transaction_date_is_an_error() {
        let settings = onboarded(300);
        for date in ["2025-6-8", " 2025-06-08"] {
            let mut bad = tx(day(2025, 6, 8), 10, Tag::Optional);
            bad.date = date.to_string();
            let err = rollover(
                &settings,
                &[bad],
                &PiggyBank::default(),
                "2025-06-07",
                day(2025, 6, 9),
            )
            .unwrap_err();
            assert_eq!(
                err,
                EngineError::InvalidDate(format!("'{date}' is not a YYYY-MM-DD date"))
            );
        }
    }
}
