//! Running balance reconstruction over chronologically sorted trades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::chronology::DatedTrade;
use super::error::WealthlogError;
use super::trade::{GainBasis, Trade};

/// A trade annotated with the account balance immediately after it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTrade {
    pub trade: Trade,
    pub executed_at: DateTime<Utc>,
    pub applied_gain: Decimal,
    pub balance_after: Decimal,
}

/// How the seed balance anchors the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reconstruction {
    /// Seed is the starting balance; fold forward in time.
    #[default]
    Forward,
    /// Seed is the balance after the most recent trade; invert each step
    /// walking back in time.
    Backward,
}

impl Reconstruction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reconstruction::Forward => "forward",
            Reconstruction::Backward => "backward",
        }
    }
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reconstruction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Reconstruction::Forward),
            "backward" => Ok(Reconstruction::Backward),
            other => Err(format!("expected forward or backward, got {other:?}")),
        }
    }
}

fn overflow(trade: &Trade) -> WealthlogError {
    WealthlogError::Reconstruction {
        reason: format!("balance overflows at trade {}", trade.id),
    }
}

/// Fold forward from `seed`: deduct fees, then apply the gain to the
/// post-fee balance. Overflow is an error.
pub fn reconstruct(
    sorted: &[DatedTrade],
    seed: Decimal,
) -> Result<Vec<AnnotatedTrade>, WealthlogError> {
    let mut running = seed;
    sorted
        .iter()
        .map(|dated| {
            let trade = &dated.trade;
            let post_fee = running
                .checked_sub(trade.fees)
                .ok_or_else(|| overflow(trade))?;
            let gain = trade
                .gain
                .applied_to(post_fee)
                .ok_or_else(|| overflow(trade))?;
            running = post_fee.checked_add(gain).ok_or_else(|| overflow(trade))?;
            Ok(AnnotatedTrade {
                trade: trade.clone(),
                executed_at: dated.executed_at,
                applied_gain: gain,
                balance_after: running,
            })
        })
        .collect()
}

/// Walk back from `final_balance`, the balance after the last trade.
/// Output stays ascending.
pub fn unwind(
    sorted: &[DatedTrade],
    final_balance: Decimal,
) -> Result<Vec<AnnotatedTrade>, WealthlogError> {
    let mut after = final_balance;
    let mut out = Vec::with_capacity(sorted.len());

    for dated in sorted.iter().rev() {
        let trade = &dated.trade;
        let (post_fee, gain) = match trade.gain.basis() {
            GainBasis::Percentage(pct) => {
                let factor = Decimal::ONE
                    .checked_add(pct)
                    .ok_or_else(|| overflow(trade))?;
                if factor.is_zero() {
                    return Err(WealthlogError::Reconstruction {
                        reason: format!(
                            "trade {} has a -100% gain; the prior balance is unrecoverable",
                            trade.id
                        ),
                    });
                }
                let post_fee = after.checked_div(factor).ok_or_else(|| overflow(trade))?;
                let gain = after.checked_sub(post_fee).ok_or_else(|| overflow(trade))?;
                (post_fee, gain)
            }
            GainBasis::Amount(amount) => (
                after.checked_sub(amount).ok_or_else(|| overflow(trade))?,
                amount,
            ),
            GainBasis::None => (after, Decimal::ZERO),
        };

        out.push(AnnotatedTrade {
            trade: trade.clone(),
            executed_at: dated.executed_at,
            applied_gain: gain,
            balance_after: after,
        });
        after = post_fee
            .checked_add(trade.fees)
            .ok_or_else(|| overflow(trade))?;
    }

    out.reverse();
    Ok(out)
}

/// Balance before the first trade implied by an annotated series. `None`
/// for an empty series or when the value does not fit.
pub fn opening_balance(annotated: &[AnnotatedTrade]) -> Option<Decimal> {
    let first = annotated.first()?;
    first
        .balance_after
        .checked_sub(first.applied_gain)?
        .checked_add(first.trade.fees)
}
