//! JSON shapes served by the WealthLog API (`/trade`, `/account`).
//!
//! Shared by the HTTP adapter and by `import` of saved API responses.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::account::Account;
use crate::domain::error::WealthlogError;
use crate::domain::trade::{Gain, Trade};

/// Ids come back as integers from the API and as strings from exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Int(i64),
    Text(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Int(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireGain {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrade {
    pub id: WireId,
    #[serde(default)]
    pub account_id: Option<WireId>,
    #[serde(default)]
    pub trade_type: Option<String>,
    pub instrument: String,
    pub direction: String,
    #[serde(default)]
    pub fees: Option<Decimal>,
    pub executed_at: String,
    #[serde(default)]
    pub gain: Option<WireGain>,
}

impl WireTrade {
    pub fn account_id(&self) -> Option<String> {
        self.account_id.clone().map(String::from)
    }

    /// Missing fees count as zero; direction must be recognisable.
    pub fn into_trade(self) -> Result<Trade, WealthlogError> {
        let gain = self.gain.unwrap_or_default();
        Ok(Trade {
            id: self.id.into(),
            instrument: self.instrument,
            direction: self.direction.parse()?,
            fees: self.fees.unwrap_or(Decimal::ZERO),
            executed_at: self.executed_at,
            gain: Gain {
                amount: gain.amount,
                percentage: gain.percentage,
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAccount {
    pub id: WireId,
    pub name: String,
    pub account_type: String,
    #[serde(default, alias = "currentBalance")]
    pub balance: Option<Decimal>,
    pub currency: String,
}

impl WireAccount {
    pub fn into_account(self) -> Result<Account, WealthlogError> {
        Ok(Account {
            id: self.id.into(),
            name: self.name,
            account_type: self.account_type.parse()?,
            balance: self.balance,
            currency: self.currency,
        })
    }
}

pub fn parse_trades(json: &str) -> Result<Vec<WireTrade>, WealthlogError> {
    serde_json::from_str(json).map_err(|e| WealthlogError::InvalidTrade {
        reason: format!("malformed trade JSON: {e}"),
    })
}

pub fn parse_accounts(json: &str) -> Result<Vec<Account>, WealthlogError> {
    let wire: Vec<WireAccount> =
        serde_json::from_str(json).map_err(|e| WealthlogError::InvalidTrade {
            reason: format!("malformed account JSON: {e}"),
        })?;
    wire.into_iter().map(WireAccount::into_account).collect()
}
