use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fintrack_core::sync::TableKey;

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Track expenses, income and investments from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name holding remote and user settings
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// User id to act as (overrides the profile)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an expense, income or investment
    Add {
        #[command(subcommand)]
        record: AddCommands,
    },
    /// List recent records
    List {
        /// Which records to show
        #[arg(value_enum)]
        table: TableArg,
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record by id
    #[command(alias = "rm")]
    Delete {
        #[arg(value_enum)]
        table: TableArg,
        /// Record id as shown by `list`
        id: i64,
    },
    /// Budget split for a month and current portfolio allocation
    Summary {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long, value_name = "MONTH")]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sync with the remote replica
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count local records per table
    Count {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AddCommands {
    /// Record an expense
    Expense {
        amount: f64,
        category: String,
        /// Budget bucket: needs, wants or savings
        #[arg(short, long, default_value = "needs")]
        bucket: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Date as YYYY-MM-DD (defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Record (or replace) a month's income
    Income {
        /// Month as YYYY-MM
        month: String,
        salary: f64,
        #[arg(long, default_value = "0")]
        other: f64,
    },
    /// Record a digital gold or silver purchase
    Metal {
        #[arg(value_enum)]
        metal: MetalArg,
        /// Amount paid, including GST
        amount_paid: f64,
        /// Price per gram at purchase
        #[arg(long, value_name = "RATE")]
        rate: f64,
        #[arg(long, default_value = "unknown")]
        platform: String,
        /// Date as YYYY-MM-DD (defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// Record a share purchase
    Equity {
        company: String,
        shares: f64,
        /// Price per share
        #[arg(long, value_name = "PRICE")]
        price: f64,
        #[arg(long, default_value = "NSE")]
        exchange: String,
        /// Date as YYYY-MM-DD (defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TableArg {
    #[value(alias = "expense")]
    Expenses,
    #[value(alias = "income")]
    Incomes,
    #[value(alias = "metal")]
    Metals,
    #[value(alias = "equity")]
    Equities,
}

impl TableArg {
    pub const fn key(self) -> TableKey {
        match self {
            Self::Expenses => TableKey::DailyEntries,
            Self::Incomes => TableKey::MonthlyIncomes,
            Self::Metals => TableKey::DigitalAssets,
            Self::Equities => TableKey::EquityAssets,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum MetalArg {
    Gold,
    Silver,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show last sync time, local record counts and remote configuration
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Remote database URL (libsql://, https://, file: or :memory:)
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Remote database auth token
        #[arg(long, value_name = "TOKEN")]
        remote_auth_token: Option<String>,
        /// User id whose records this profile tracks
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}
