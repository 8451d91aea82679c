//! Accounts and their types.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::error::WealthlogError;
use super::trade::TradeType;

/// Account types as stored by the backend. Parsing is exact: an unknown
/// string is an error rather than a silent `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    FxCommodity,
    Stocks,
    Crypto,
    RealEstate,
    Bank,
    Other,
}

impl AccountType {
    pub const ALL: [AccountType; 6] = [
        AccountType::FxCommodity,
        AccountType::Stocks,
        AccountType::Crypto,
        AccountType::RealEstate,
        AccountType::Bank,
        AccountType::Other,
    ];

    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::FxCommodity => "FX_COMMODITY",
            AccountType::Stocks => "STOCKS",
            AccountType::Crypto => "CRYPTO",
            AccountType::RealEstate => "REAL_ESTATE",
            AccountType::Bank => "BANK",
            AccountType::Other => "OTHER",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::FxCommodity => "FX",
            AccountType::Stocks => "Stocks",
            AccountType::Crypto => "Crypto",
            AccountType::RealEstate => "Real Estate",
            AccountType::Bank => "Bank",
            AccountType::Other => "Other",
        }
    }

    /// The trade type logged against accounts of this type, if any.
    pub fn trade_type(&self) -> Option<TradeType> {
        match self {
            AccountType::FxCommodity => Some(TradeType::Fx),
            AccountType::Stocks => Some(TradeType::Stocks),
            AccountType::Crypto => Some(TradeType::Crypto),
            AccountType::RealEstate | AccountType::Bank | AccountType::Other => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountType {
    type Err = WealthlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| WealthlogError::UnknownAccountType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    /// Balance after all recorded trades. `None` when the backend has none.
    pub balance: Option<Decimal>,
    pub currency: String,
}

impl Account {
    pub fn seed_balance(&self) -> Result<Decimal, WealthlogError> {
        self.balance.ok_or_else(|| WealthlogError::MissingSeedBalance {
            account_id: self.id.clone(),
        })
    }
}

pub fn find_account<'a>(accounts: &'a [Account], id: &str) -> Result<&'a Account, WealthlogError> {
    accounts
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| WealthlogError::AccountNotFound {
            account_id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_account(balance: Option<Decimal>) -> Account {
        Account {
            id: "acc-1".into(),
            name: "FX Main".into(),
            account_type: AccountType::FxCommodity,
            balance,
            currency: "USD".into(),
        }
    }

    #[test]
    fn fx_commodity_labels_as_fx() {
        let t: AccountType = "FX_COMMODITY".parse().unwrap();
        assert_eq!(t, AccountType::FxCommodity);
        assert_eq!(t.label(), "FX");
        assert_eq!(t.trade_type(), Some(TradeType::Fx));
    }

    #[test]
    fn every_type_round_trips() {
        for t in AccountType::ALL {
            assert_eq!(t.as_str().parse::<AccountType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = "COMMODITY_FUTURES".parse::<AccountType>().unwrap_err();
        assert!(matches!(err, WealthlogError::UnknownAccountType(s) if s == "COMMODITY_FUTURES"));
    }

    #[test]
    fn lowercase_is_not_accepted() {
        assert!("stocks".parse::<AccountType>().is_err());
    }

    #[test]
    fn non_trading_types_have_no_trade_type() {
        assert_eq!(AccountType::RealEstate.trade_type(), None);
        assert_eq!(AccountType::Bank.trade_type(), None);
        assert_eq!(AccountType::Other.trade_type(), None);
    }

    #[test]
    fn seed_balance_present() {
        let account = sample_account(Some(dec!(1000)));
        assert_eq!(account.seed_balance().unwrap(), dec!(1000));
    }

    #[test]
    fn seed_balance_missing_is_error_not_zero() {
        let account = sample_account(None);
        let err = account.seed_balance().unwrap_err();
        assert!(matches!(err, WealthlogError::MissingSeedBalance { account_id } if account_id == "acc-1"));
    }

    #[test]
    fn find_account_by_id() {
        let accounts = vec![sample_account(Some(dec!(1)))];
        assert_eq!(find_account(&accounts, "acc-1").unwrap().name, "FX Main");
        assert!(matches!(
            find_account(&accounts, "nope"),
            Err(WealthlogError::AccountNotFound { .. })
        ));
    }
}
