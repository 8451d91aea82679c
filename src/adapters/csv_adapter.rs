//! CSV export directory adapter.
//!
//! Expects `accounts.csv` and `trades.csv` side by side. Empty cells mean
//! "absent", which matters for the balance and the two gain columns.

use crate::domain::account::Account;
use crate::domain::error::WealthlogError;
use crate::domain::trade::{Gain, Trade, TradeType, parse_decimal, parse_optional_decimal};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::{AccountPort, TradePort};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const TRADES_FILE: &str = "trades.csv";

#[derive(Debug, Deserialize)]
struct AccountRow {
    id: String,
    name: String,
    account_type: String,
    #[serde(default)]
    balance: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TradeRow {
    pub id: String,
    pub account_id: String,
    pub trade_type: String,
    pub instrument: String,
    pub direction: String,
    #[serde(default)]
    pub fees: String,
    pub executed_at: String,
    #[serde(default)]
    pub amount_gain: String,
    #[serde(default)]
    pub percentage_gain: String,
}

impl TradeRow {
    pub(crate) fn into_trade(self) -> Result<Trade, WealthlogError> {
        let fees = if self.fees.trim().is_empty() {
            rust_decimal::Decimal::ZERO
        } else {
            parse_decimal("fees", &self.fees)?
        };
        Ok(Trade {
            direction: self.direction.parse()?,
            fees,
            gain: Gain {
                amount: parse_optional_decimal("amount_gain", &self.amount_gain)?,
                percentage: parse_optional_decimal("percentage_gain", &self.percentage_gain)?,
            },
            id: self.id,
            instrument: self.instrument,
            executed_at: self.executed_at,
        })
    }
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, WealthlogError> {
        let dir = config
            .get_trimmed("csv", "dir")
            .ok_or_else(|| WealthlogError::ConfigMissing {
                section: "csv".into(),
                key: "dir".into(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn reader(&self, file: &str) -> Result<csv::Reader<fs::File>, WealthlogError> {
        let path = self.base_path.join(file);
        open_reader(&path)
    }
}

pub(crate) fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>, WealthlogError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| WealthlogError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
}

pub(crate) fn read_account_rows(
    rdr: &mut csv::Reader<fs::File>,
) -> Result<Vec<Account>, WealthlogError> {
    let mut accounts = Vec::new();
    for result in rdr.deserialize::<AccountRow>() {
        let row = result.map_err(|e| WealthlogError::Database {
            reason: format!("CSV parse error: {}", e),
        })?;
        accounts.push(Account {
            account_type: row.account_type.parse()?,
            balance: parse_optional_decimal("balance", &row.balance)?,
            id: row.id,
            name: row.name,
            currency: row.currency,
        });
    }
    Ok(accounts)
}

pub(crate) fn read_trade_rows(
    rdr: &mut csv::Reader<fs::File>,
) -> Result<Vec<TradeRow>, WealthlogError> {
    rdr.deserialize::<TradeRow>()
        .map(|result| {
            result.map_err(|e| WealthlogError::Database {
                reason: format!("CSV parse error: {}", e),
            })
        })
        .collect()
}

impl AccountPort for CsvAdapter {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError> {
        let mut rdr = self.reader(ACCOUNTS_FILE)?;
        let accounts = read_account_rows(&mut rdr)?;
        tracing::debug!(count = accounts.len(), dir = %self.base_path.display(), "Loaded accounts");
        Ok(accounts)
    }
}

impl TradePort for CsvAdapter {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError> {
        let mut rdr = self.reader(TRADES_FILE)?;
        let mut trades = Vec::new();

        for row in read_trade_rows(&mut rdr)? {
            if row.account_id != account_id {
                continue;
            }
            if row.trade_type.parse::<TradeType>()? != trade_type {
                continue;
            }
            trades.push(row.into_trade()?);
        }

        tracing::debug!(account_id, %trade_type, count = trades.len(), "Fetched trades from CSV");
        Ok(trades)
    }
}
