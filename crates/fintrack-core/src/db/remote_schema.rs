//! Change sets applied to the remote replica.
//!
//! Each change set is identified by a unique tag recorded in the ledger table
//! once applied. Every statement must be safe to run twice: a replica whose
//! tables vanished but whose ledger survived gets all change sets re-applied.

/// Ledger of applied change-set tags, kept in the remote database itself
pub const MIGRATION_LEDGER_TABLE: &str = "_fintrack_migrations";

/// One tagged schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSet {
    pub tag: &'static str,
    pub statements: &'static [&'static str],
}

/// Remote change sets in application order
pub const REMOTE_CHANGE_SETS: &[ChangeSet] = &[
    ChangeSet {
        tag: "0001_create_ledger_tables",
        statements: &[
            "CREATE TABLE IF NOT EXISTS daily_entries (
                id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                amount REAL NOT NULL,
                bucket TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            )",
            "CREATE TABLE IF NOT EXISTS monthly_incomes (
                id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                month TEXT NOT NULL,
                salary REAL NOT NULL,
                other_income REAL NOT NULL,
                total_income REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            )",
            "CREATE TABLE IF NOT EXISTS digital_assets (
                id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                metal TEXT NOT NULL,
                platform TEXT NOT NULL,
                rate_per_gram REAL NOT NULL,
                amount_paid REAL NOT NULL,
                weight_grams REAL NOT NULL,
                net_value REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            )",
            "CREATE TABLE IF NOT EXISTS equity_assets (
                id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                company TEXT NOT NULL,
                exchange TEXT NOT NULL,
                price_per_share REAL NOT NULL,
                shares REAL NOT NULL,
                total_amount REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, id)
            )",
        ],
    },
    ChangeSet {
        tag: "0002_owner_date_indexes",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_remote_daily_entries_user_date ON daily_entries(user_id, date DESC)",
            "CREATE INDEX IF NOT EXISTS idx_remote_digital_assets_user_date ON digital_assets(user_id, date DESC)",
            "CREATE INDEX IF NOT EXISTS idx_remote_equity_assets_user_date ON equity_assets(user_id, date DESC)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_remote_monthly_incomes_user_month ON monthly_incomes(user_id, month)",
        ],
    },
];

/// DDL for the ledger table
pub fn ledger_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATION_LEDGER_TABLE} (
            tag TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        )"
    )
}
