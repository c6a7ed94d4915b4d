use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Money, Tag};

#[derive(Debug, Parser)]
#[command(name = "jieyou", version)]
#[command(about = "Daily budget tracker that banks unspent allowance into a piggy bank")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    pub config: Option<String>,
    /// Override the state file path.
    #[arg(long)]
    pub state: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub level: Option<String>,
    /// Pretend today is this day (YYYY-MM-DD).
    #[arg(long)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Today's budget, this month's spending and the piggy bank.
    Status,
    /// Bank the savings of the days elapsed since the last run.
    Reconcile,
    /// Log an expense.
    Add(AddArgs),
    /// Set the monthly budget (completes onboarding).
    Budget { amount: Money },
    /// Manage fixed monthly expenses.
    Fixed(Fixed),
    /// Per-day budget and savings of a month.
    Calendar {
        /// Month as YYYY-MM. Defaults to the current month.
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Enable remote mirroring for an environment, or disable it when omitted.
    Cloud { env_id: Option<String> },
    /// Fetch the remote transactions (read only, nothing is merged).
    Pull {
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Erase everything and start over.
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    pub amount: Money,
    /// necessary, fixed or optional. Repeatable.
    #[arg(long = "tag", short, required = true, value_parser = parse_tag)]
    pub tags: Vec<Tag>,
    /// Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct Fixed {
    #[command(subcommand)]
    pub command: FixedCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum FixedCommand {
    List,
    Add { label: String, amount: Money },
    Remove { id: String },
}

fn parse_tag(raw: &str) -> Result<Tag, String> {
    Tag::try_from(raw).map_err(|err| err.to_string())
}

fn parse_month(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), engine::DATE_FORMAT)
        .map_err(|_| format!("'{raw}' is not a YYYY-MM month"))
}
