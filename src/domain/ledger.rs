//! Ledger assembly: sort, reconstruct, reverse for display.

use rust_decimal::Decimal;

use super::account::Account;
use super::balance::{self, AnnotatedTrade, Reconstruction};
use super::chronology::sort_chronologically;
use super::error::WealthlogError;
use super::trade::Trade;

/// Annotated trades for one account, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub account_id: String,
    pub currency: String,
    pub seed_balance: Decimal,
    pub reconstruction: Reconstruction,
    pub rows: Vec<AnnotatedTrade>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total fees across all rows.
    pub fn total_fees(&self) -> Result<Decimal, WealthlogError> {
        checked_total("fees", self.rows.iter().map(|r| r.trade.fees))
    }

    /// Total gain applied across all rows.
    pub fn total_gain(&self) -> Result<Decimal, WealthlogError> {
        checked_total("gain", self.rows.iter().map(|r| r.applied_gain))
    }
}

fn checked_total(
    what: &str,
    mut values: impl Iterator<Item = Decimal>,
) -> Result<Decimal, WealthlogError> {
    values
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| WealthlogError::Reconstruction {
            reason: format!("total {what} overflows"),
        })
}

/// Sort then fold forward from `seed`. Result is ascending and independent
/// of input order when timestamps are distinct.
pub fn reconstruct_balances(
    trades: Vec<Trade>,
    seed: Decimal,
) -> Result<Vec<AnnotatedTrade>, WealthlogError> {
    let sorted = sort_chronologically(trades)?;
    balance::reconstruct(&sorted, seed)
}

/// Most recent first.
pub fn for_display(mut annotated: Vec<AnnotatedTrade>) -> Vec<AnnotatedTrade> {
    annotated.reverse();
    annotated
}

pub fn build_ledger(
    account: &Account,
    trades: Vec<Trade>,
    reconstruction: Reconstruction,
) -> Result<Ledger, WealthlogError> {
    let seed = account.seed_balance()?;
    let sorted = sort_chronologically(trades)?;

    let annotated = match reconstruction {
        Reconstruction::Forward => balance::reconstruct(&sorted, seed)?,
        Reconstruction::Backward => balance::unwind(&sorted, seed)?,
    };

    tracing::debug!(
        account = %account.id,
        trades = annotated.len(),
        mode = %reconstruction,
        "Reconstructed balances"
    );

    Ok(Ledger {
        account_id: account.id.clone(),
        currency: account.currency.clone(),
        seed_balance: seed,
        reconstruction,
        rows: for_display(annotated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountType;
    use crate::domain::trade::{Direction, Gain};
    use rust_decimal_macros::dec;

    fn trade(id: &str, executed_at: &str, fees: Decimal, gain: Gain) -> Trade {
        Trade {
            id: id.into(),
            instrument: "XAUUSD".into(),
            direction: Direction::Short,
            fees,
            executed_at: executed_at.into(),
            gain,
        }
    }

    fn account(balance: Option<Decimal>) -> Account {
        Account {
            id: "fx".into(),
            name: "FX".into(),
            account_type: AccountType::FxCommodity,
            balance,
            currency: "EUR".into(),
        }
    }

    fn sample_trades() -> Vec<Trade> {
        vec![
            trade("b", "2024-02-01", dec!(0), Gain::percentage(dec!(0.10))),
            trade("a", "2024-01-01", dec!(10), Gain::amount(dec!(50))),
        ]
    }

    #[test]
    fn reconstruct_balances_sorts_first() {
        let out = reconstruct_balances(sample_trades(), dec!(1000)).unwrap();
        let ids: Vec<_> = out.iter().map(|a| a.trade.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(out[1].balance_after, dec!(1144));
    }

    #[test]
    fn for_display_is_most_recent_first() {
        let out = for_display(reconstruct_balances(sample_trades(), dec!(1000)).unwrap());
        let ids: Vec<_> = out.iter().map(|a| a.trade.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn build_ledger_forward_uses_stored_balance_as_seed() {
        let ledger = build_ledger(
            &account(Some(dec!(1000))),
            sample_trades(),
            Reconstruction::Forward,
        )
        .unwrap();
        assert_eq!(ledger.account_id, "fx");
        assert_eq!(ledger.currency, "EUR");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rows[0].balance_after, dec!(1144));
        assert_eq!(ledger.rows[1].balance_after, dec!(1040));
        assert_eq!(ledger.total_fees().unwrap(), dec!(10));
        assert_eq!(ledger.total_gain().unwrap(), dec!(154));
    }

    #[test]
    fn build_ledger_backward_ends_at_stored_balance() {
        let ledger = build_ledger(
            &account(Some(dec!(1144))),
            sample_trades(),
            Reconstruction::Backward,
        )
        .unwrap();
        assert_eq!(ledger.rows[0].balance_after, dec!(1144));
        assert_eq!(ledger.rows[1].balance_after, dec!(1040));
    }

    #[test]
    fn build_ledger_without_balance_refuses() {
        let err = build_ledger(&account(None), sample_trades(), Reconstruction::Forward)
            .unwrap_err();
        assert!(matches!(err, WealthlogError::MissingSeedBalance { .. }));
    }

    #[test]
    fn build_ledger_propagates_bad_timestamp() {
        let mut trades = sample_trades();
        trades.push(trade("z", "not a date", dec!(0), Gain::default()));
        let err =
            build_ledger(&account(Some(dec!(1))), trades, Reconstruction::Forward).unwrap_err();
        assert!(matches!(err, WealthlogError::InvalidTimestamp { trade_id, .. } if trade_id == "z"));
    }

    #[test]
    fn empty_ledger() {
        let ledger =
            build_ledger(&account(Some(dec!(5))), Vec::new(), Reconstruction::Forward).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total_fees().unwrap(), Decimal::ZERO);
    }
}
