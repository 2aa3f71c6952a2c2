//! The closed set of tables that take part in sync.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logical table identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKey {
    DailyEntries,
    MonthlyIncomes,
    DigitalAssets,
    EquityAssets,
}

impl TableKey {
    /// Every synced table, in sync order
    pub const ALL: [Self; 4] = [
        Self::DailyEntries,
        Self::MonthlyIncomes,
        Self::DigitalAssets,
        Self::EquityAssets,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyEntries => "daily_entries",
            Self::MonthlyIncomes => "monthly_incomes",
            Self::DigitalAssets => "digital_assets",
            Self::EquityAssets => "equity_assets",
        }
    }

    /// Registry entry for this table
    pub fn spec(self) -> &'static TableSpec {
        match self {
            Self::DailyEntries => &REGISTRY[0],
            Self::MonthlyIncomes => &REGISTRY[1],
            Self::DigitalAssets => &REGISTRY[2],
            Self::EquityAssets => &REGISTRY[3],
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TableKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown table '{}'", s.trim())))
    }
}

/// How one logical table is reached on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub key: TableKey,
    /// Table name in the on-device database
    pub local_table: &'static str,
    /// Table name in the remote replica
    pub remote_table: &'static str,
    /// Column holding the owning user's id, same name on both sides
    pub owner_column: &'static str,
}

/// Registered tables. Order matches `TableKey::ALL`.
pub static REGISTRY: [TableSpec; 4] = [
    TableSpec {
        key: TableKey::DailyEntries,
        local_table: "daily_entries",
        remote_table: "daily_entries",
        owner_column: "user_id",
    },
    TableSpec {
        key: TableKey::MonthlyIncomes,
        local_table: "monthly_incomes",
        remote_table: "monthly_incomes",
        owner_column: "user_id",
    },
    TableSpec {
        key: TableKey::DigitalAssets,
        local_table: "digital_assets",
        remote_table: "digital_assets",
        owner_column: "user_id",
    },
    TableSpec {
        key: TableKey::EquityAssets,
        local_table: "equity_assets",
        remote_table: "equity_assets",
        owner_column: "user_id",
    },
];

/// Remote table names the readiness check expects to exist.
pub fn remote_table_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|spec| spec.remote_table).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_key_order() {
        let keys: Vec<TableKey> = REGISTRY.iter().map(|spec| spec.key).collect();
        assert_eq!(keys, TableKey::ALL.to_vec());
        for key in TableKey::ALL {
            assert_eq!(key.spec().key, key);
        }
    }

    #[test]
    fn table_key_parses_cli_spellings() {
        assert_eq!("daily-entries".parse::<TableKey>().unwrap(), TableKey::DailyEntries);
        assert_eq!(" EQUITY_ASSETS ".parse::<TableKey>().unwrap(), TableKey::EquityAssets);
        assert!("notes".parse::<TableKey>().is_err());
    }

    #[test]
    fn remote_table_names_cover_registry() {
        assert_eq!(
            remote_table_names(),
            vec!["daily_entries", "monthly_incomes", "digital_assets", "equity_assets"]
        );
    }
}
