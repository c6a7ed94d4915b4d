//! Command handlers. Each one prints its result to stdout.

use chrono::NaiveDate;
use engine::{Engine, NewTransaction, Reconciliation, RemoteFilter, TIERS};
use tracing::{error, info};

use crate::{
    cli::{AddArgs, Command, FixedCommand},
    error::{AppError, Result},
};

/// Reconciles and logs the outcome. A failure is reported but never aborts
/// the command: the previous state is kept and the next run retries.
pub async fn reconcile(engine: &Engine, today: NaiveDate) -> Option<Reconciliation> {
    match engine.reconcile(today).await {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            error!("reconciliation failed, state left unchanged: {err}");
            None
        }
    }
}

pub async fn run(engine: &Engine, command: Command, today: NaiveDate) -> Result<()> {
    match command {
        Command::Status => status(engine, today).await,
        Command::Reconcile => {
            match reconcile(engine, today).await {
                Some(Reconciliation::Applied(rollover)) => println!(
                    "Banked {} over {} day(s), processed through {}",
                    rollover.banked(),
                    rollover.days.len(),
                    rollover.last_processed_date
                ),
                Some(Reconciliation::NotOnboarded) => {
                    println!("No budget set yet, run `jieyou budget <amount>` first")
                }
                Some(Reconciliation::UpToDate | Reconciliation::InProgress) => {
                    println!("Already up to date")
                }
                None => println!("Reconciliation failed, see the log"),
            }
            Ok(())
        }
        Command::Add(args) => add(engine, args, today).await,
        Command::Budget { amount } => {
            engine.set_monthly_budget(amount).await?;
            println!("Monthly budget set to {amount}");
            reconcile(engine, today).await;
            Ok(())
        }
        Command::Fixed(fixed) => {
            match fixed.command {
                FixedCommand::List => {
                    let state = engine.snapshot().await;
                    if state.settings.fixed_expenses.is_empty() {
                        println!("No fixed expenses");
                    }
                    for expense in &state.settings.fixed_expenses {
                        println!("{}  {:>10}  {}", expense.id, expense.amount, expense.label);
                    }
                    println!("Total: {}", state.settings.fixed_total());
                }
                FixedCommand::Add { label, amount } => {
                    let expense = engine.add_fixed_expense(&label, amount).await?;
                    println!("Added fixed expense {} ({})", expense.label, expense.id);
                }
                FixedCommand::Remove { id } => {
                    let expense = engine.remove_fixed_expense(&id).await?;
                    println!("Removed fixed expense {}", expense.label);
                }
            }
            Ok(())
        }
        Command::Calendar { month } => {
            let reference = month.unwrap_or(today);
            for day in engine.calendar(reference).await {
                let marker = if day.is_positive { '+' } else { '-' };
                println!(
                    "{}  budget {:>8.2}  spent {:>8.2}  {marker} {:>8.2}",
                    day.date,
                    day.budget,
                    day.expenses,
                    day.savings.abs()
                );
            }
            Ok(())
        }
        Command::Cloud { env_id } => {
            let enabled = env_id.is_some();
            engine.set_cloud_env(env_id).await?;
            println!(
                "Remote mirroring {}",
                if enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Command::Pull { since } => {
            match engine.pull_remote(RemoteFilter { since }).await {
                Ok(remote) => println!(
                    "Remote holds {} transaction(s); merging is not supported",
                    remote.len()
                ),
                Err(err) => println!("Remote unavailable: {err}"),
            }
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(AppError::Invalid(
                    "reset erases all data, pass --yes to confirm".to_string(),
                ));
            }
            engine.reset(today).await?;
            println!("All data erased");
            Ok(())
        }
    }
}

async fn add(engine: &Engine, args: AddArgs, today: NaiveDate) -> Result<()> {
    let date = args.date.unwrap_or(today);
    if date > today {
        return Err(AppError::Invalid(format!(
            "cannot log an expense in the future ({date})"
        )));
    }
    let tx = engine
        .add_transaction(NewTransaction {
            date,
            amount: args.amount,
            tags: args.tags,
            note: args.note,
        })
        .await?;
    info!("logged {} on {}", tx.amount, tx.date);

    let view = engine.day_view(date).await;
    println!(
        "Logged {} on {}. Left for that day: {:.2}",
        tx.amount, tx.date, view.remaining
    );
    reconcile(engine, today).await;
    Ok(())
}

async fn status(engine: &Engine, today: NaiveDate) -> Result<()> {
    let state = engine.snapshot().await;
    if !state.settings.is_onboarded {
        println!("Welcome! Set a monthly budget with `jieyou budget <amount>`.");
        return Ok(());
    }

    let view = engine.day_view(today).await;
    let summary = engine.month_summary(today).await?;
    let bank = &state.piggy_bank;

    println!("Today ({today})");
    println!("  allowance   {}", view.allowance);
    println!("  spent       {}", view.spent);
    println!("  remaining   {:.2}", view.remaining);
    println!("This month");
    println!("  budget      {}", state.settings.monthly_budget);
    println!("  fixed       {}", summary.total_fixed);
    println!("  spent       {}", summary.total_variable_spent);
    println!("  remaining   {}", summary.monthly_remaining);
    println!(
        "Piggy bank (level {}/{}, capacity {})",
        bank.level(),
        TIERS.len(),
        bank.capacity_level
    );
    println!(
        "  fill        {} ({:.0}%)",
        bank.current_amount,
        bank.progress() * 100.0
    );
    println!("  saved ever  {}", bank.total_saved_history);
    if let Some(day) = bank.last_upgraded_at {
        println!("  upgraded    {day}");
    }
    println!("Processed through {}", state.last_processed_date);
    Ok(())
}
