//! Trade and account source ports.

use crate::domain::account::Account;
use crate::domain::error::WealthlogError;
use crate::domain::trade::{Trade, TradeType};

/// Equivalent of `GET /trade?accountId=&tradeType=`. Implementations must
/// return trades in fetch order; the sorter relies on it for ties.
pub trait TradePort {
    fn fetch_trades(
        &self,
        account_id: &str,
        trade_type: TradeType,
    ) -> Result<Vec<Trade>, WealthlogError>;
}

pub trait AccountPort {
    fn list_accounts(&self) -> Result<Vec<Account>, WealthlogError>;
}

/// Anything that can supply both accounts and their trades.
pub trait LedgerSource: TradePort + AccountPort {}

impl<T: TradePort + AccountPort> LedgerSource for T {}
