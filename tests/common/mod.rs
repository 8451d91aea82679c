#![allow(dead_code)]

use rust_decimal::Decimal;
use std::collections::HashMap;
use wealthlog::domain::account::{Account, AccountType};
use wealthlog::domain::error::WealthlogError;
use wealthlog::domain::trade::{Direction, Gain, Trade, TradeType};
use wealthlog::ports::trade_port::{AccountPort, TradePort};

/// In-memory source keyed by (account id, trade type). Trades are returned
/// in the order they were added.
pub struct MockSource {
    pub accounts: Vec<Account>,
    pub trades: HashMap<(String, TradeType), Vec<Trade>>,
    pub errors: HashMap<String, String>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
            trades: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_trades(mut self, account_id: &str, trade_type: TradeType, trades: Vec<Trade>) -> Self {
        self.trades
            .entry((account_id.to_string(), trade_type))
            .or_default()
            .extend(trades);
        self
    }

    pub fn with_error(mut self, account_id: &str, reason: &str) -> Self {
        self.errors.insert(account_id.to_string(), reason.to_string());
        self
    }
}

impl AccountPort for MockSource {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError> {
        Ok(self.accounts.clone())
    }
}

impl TradePort for MockSource {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError> {
        if let Some(reason) = self.errors.get(account_id) {
            return Err(WealthlogError::Fetch {
                reason: reason.clone(),
            });
        }
        Ok(self
            .trades
            .get(&(account_id.to_string(), trade_type))
            .cloned()
            .unwrap_or_default())
    }
}

pub fn make_account(id: &str, account_type: AccountType, balance: Option<Decimal>) -> Account {
    Account {
        id: id.to_string(),
        name: format!("Account {id}"),
        account_type,
        balance,
        currency: "USD".to_string(),
    }
}

pub fn make_trade(id: &str, executed_at: &str, fees: Decimal, gain: Gain) -> Trade {
    Trade {
        id: id.to_string(),
        instrument: "EURUSD".to_string(),
        direction: Direction::Long,
        fees,
        executed_at: executed_at.to_string(),
        gain,
    }
}

pub fn amount_trade(id: &str, executed_at: &str, fees: Decimal, amount: Decimal) -> Trade {
    make_trade(id, executed_at, fees, Gain::amount(amount))
}

pub fn percentage_trade(id: &str, executed_at: &str, fees: Decimal, percentage: Decimal) -> Trade {
    make_trade(id, executed_at, fees, Gain::percentage(percentage))
}
