//! SQLite ledger store.
//!
//! Decimals are stored as TEXT so balances survive round trips exactly.
//! Trades come back in insertion order, which stands in for fetch order.

use crate::domain::account::Account;
use crate::domain::config_validation::resolve_pool_size;
use crate::domain::error::WealthlogError;
use crate::domain::trade::{Gain, Trade, TradeType, parse_decimal, parse_optional_decimal};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::{AccountPort, TradePort};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Transaction, params};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> WealthlogError {
    WealthlogError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, WealthlogError> {
        let db_path =
            config
                .get_trimmed("sqlite", "path")
                .ok_or_else(|| WealthlogError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = resolve_pool_size(config)?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| WealthlogError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "Opened SQLite store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, WealthlogError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| WealthlogError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, WealthlogError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| WealthlogError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), WealthlogError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL,
                balance TEXT,
                currency TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                account_id TEXT NOT NULL,
                trade_type TEXT NOT NULL,
                instrument TEXT NOT NULL,
                direction TEXT NOT NULL,
                fees TEXT NOT NULL,
                executed_at TEXT NOT NULL,
                amount_gain TEXT,
                percentage_gain TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trades_account_type ON trades(account_id, trade_type);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Writes accounts and every trade group in one transaction. Any failure
    /// rolls the whole batch back. Returns the number of trades written.
    pub fn import<'a>(
        &self,
        accounts: &[Account],
        groups: impl IntoIterator<Item = (&'a str, TradeType, &'a [Trade])>,
    ) -> Result<usize, WealthlogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        write_accounts(&tx, accounts)?;
        let mut written = 0;
        for (account_id, trade_type, trades) in groups {
            write_trades(&tx, account_id, trade_type, trades)?;
            written += trades.len();
        }

        tx.commit().map_err(query_err)?;
        tracing::debug!(accounts = accounts.len(), trades = written, "Imported into SQLite");
        Ok(written)
    }
}

fn write_accounts(tx: &Transaction<'_>, accounts: &[Account]) -> Result<(), WealthlogError> {
    for account in accounts {
        tx.execute(
            "INSERT OR REPLACE INTO accounts (id, name, account_type, balance, currency)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id,
                account.name,
                account.account_type.as_str(),
                account.balance.map(|b| b.to_string()),
                account.currency
            ],
        )
        .map_err(query_err)?;
    }
    Ok(())
}

fn write_trades(
    tx: &Transaction<'_>,
    account_id: &str,
    trade_type: TradeType,
    trades: &[Trade],
) -> Result<(), WealthlogError> {
    for trade in trades {
        tx.execute(
            "INSERT OR REPLACE INTO trades
                (id, account_id, trade_type, instrument, direction, fees,
                 executed_at, amount_gain, percentage_gain)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                trade.id,
                account_id,
                trade_type.as_query_str(),
                trade.instrument,
                trade.direction.as_str(),
                trade.fees.to_string(),
                trade.executed_at,
                trade.gain.amount.map(|d| d.to_string()),
                trade.gain.percentage.map(|d| d.to_string())
            ],
        )
        .map_err(query_err)?;
    }
    Ok(())
}

impl AccountPort for SqliteAdapter {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, account_type, balance, currency FROM accounts ORDER BY id")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(query_err)?;

        let mut accounts = Vec::new();
        for row in rows {
            let (id, name, account_type, balance, currency) = row.map_err(query_err)?;
            accounts.push(Account {
                id,
                name,
                account_type: account_type.parse()?,
                balance: parse_optional_decimal("balance", balance.as_deref().unwrap_or(""))?,
                currency,
            });
        }

        Ok(accounts)
    }
}

impl TradePort for SqliteAdapter {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError> {
        let conn = self.conn()?;

        let query = "SELECT id, instrument, direction, fees, executed_at, amount_gain, percentage_gain
                     FROM trades
                     WHERE account_id = ?1 AND trade_type = ?2
                     ORDER BY seq ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map(params![account_id, trade_type.as_query_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            let (id, instrument, direction, fees, executed_at, amount, percentage) =
                row.map_err(query_err)?;
            trades.push(Trade {
                id,
                instrument,
                direction: direction.parse()?,
                fees: parse_decimal("fees", &fees)?,
                executed_at,
                gain: Gain {
                    amount: parse_optional_decimal("amount_gain", amount.as_deref().unwrap_or(""))?,
                    percentage: parse_optional_decimal(
                        "percentage_gain",
                        percentage.as_deref().unwrap_or(""),
                    )?,
                },
            });
        }

        tracing::debug!(account_id, %trade_type, count = trades.len(), "Fetched trades from SQLite");
        Ok(trades)
    }
}
