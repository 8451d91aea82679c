//! PostgreSQL adapter reading the backend's accounts and trades tables.

use crate::domain::account::Account;
use crate::domain::error::WealthlogError;
use crate::domain::trade::{Gain, Trade, TradeType, parse_decimal, parse_optional_decimal};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::{AccountPort, TradePort};
use chrono::{DateTime, SecondsFormat, Utc};
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::cell::RefCell;

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, WealthlogError> {
        let connection_string = config
            .get_trimmed("postgres", "connection_string")
            .ok_or_else(|| WealthlogError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| WealthlogError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

impl AccountPort for PostgresAdapter {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError> {
        // numeric is read as text to keep it exact
        let query = "SELECT id::text, name, account_type, balance::text, currency \
                     FROM public.accounts \
                     ORDER BY id";

        let rows = self
            .client
            .borrow_mut()
            .query(query, &[])
            .map_err(|e| WealthlogError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        rows.into_iter()
            .map(|row| -> Result<Account, WealthlogError> {
                let account_type: String = row.get(2);
                let balance: Option<String> = row.get(3);
                Ok(Account {
                    id: row.get(0),
                    name: row.get(1),
                    account_type: account_type.parse()?,
                    balance: parse_optional_decimal("balance", balance.as_deref().unwrap_or(""))?,
                    currency: row.get(4),
                })
            })
            .collect()
    }
}

impl TradePort for PostgresAdapter {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError> {
        let query = "SELECT id::text, instrument, direction, fees::text, executed_at, \
                            amount_gain::text, percentage_gain::text \
                     FROM public.trades \
                     WHERE account_id::text = $1 AND trade_type = $2 \
                     ORDER BY id ASC";

        let trade_type_str = trade_type.as_query_str();
        let params: &[&(dyn ToSql + Sync)] = &[&account_id, &trade_type_str];
        let rows = self
            .client
            .borrow_mut()
            .query(query, params)
            .map_err(|e| WealthlogError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let trades = rows
            .into_iter()
            .map(|row| -> Result<Trade, WealthlogError> {
                let direction: String = row.get(2);
                let fees: String = row.get(3);
                let executed_at: DateTime<Utc> = row.get(4);
                let amount: Option<String> = row.get(5);
                let percentage: Option<String> = row.get(6);
                Ok(Trade {
                    id: row.get(0),
                    instrument: row.get(1),
                    direction: direction.parse()?,
                    fees: parse_decimal("fees", &fees)?,
                    executed_at: executed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    gain: Gain {
                        amount: parse_optional_decimal(
                            "amount_gain",
                            amount.as_deref().unwrap_or(""),
                        )?,
                        percentage: parse_optional_decimal(
                            "percentage_gain",
                            percentage.as_deref().unwrap_or(""),
                        )?,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(account_id, %trade_type, count = trades.len(), "Fetched trades from Postgres");
        Ok(trades)
    }
}
