//! Trade records as fetched from a trade source.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::error::WealthlogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = WealthlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(WealthlogError::InvalidTrade {
                reason: format!("unknown direction {other:?}"),
            }),
        }
    }
}

/// Value of the `tradeType` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeType {
    Fx,
    Stocks,
    Crypto,
}

impl TradeType {
    pub fn as_query_str(&self) -> &'static str {
        match self {
            TradeType::Fx => "FX",
            TradeType::Stocks => "STOCKS",
            TradeType::Crypto => "CRYPTO",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_str())
    }
}

impl FromStr for TradeType {
    type Err = WealthlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FX" => Ok(TradeType::Fx),
            "STOCKS" => Ok(TradeType::Stocks),
            "CRYPTO" => Ok(TradeType::Crypto),
            other => Err(WealthlogError::InvalidTrade {
                reason: format!("unknown trade type {other:?}"),
            }),
        }
    }
}

/// Gain attributed to a trade. Percentages are fractions (0.05 = +5%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gain {
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

/// Which gain field is authoritative for a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainBasis {
    Percentage(Decimal),
    Amount(Decimal),
    None,
}

impl Gain {
    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            percentage: None,
        }
    }

    pub fn percentage(percentage: Decimal) -> Self {
        Self {
            amount: None,
            percentage: Some(percentage),
        }
    }

    /// Percentage wins when both fields are populated.
    pub fn basis(&self) -> GainBasis {
        match (self.percentage, self.amount) {
            (Some(pct), _) => GainBasis::Percentage(pct),
            (None, Some(amount)) => GainBasis::Amount(amount),
            (None, None) => GainBasis::None,
        }
    }

    /// Gain produced on the given post-fee balance, `None` on overflow.
    pub fn applied_to(&self, post_fee_balance: Decimal) -> Option<Decimal> {
        match self.basis() {
            GainBasis::Percentage(pct) => post_fee_balance.checked_mul(pct),
            GainBasis::Amount(amount) => Some(amount),
            GainBasis::None => Some(Decimal::ZERO),
        }
    }
}

/// A trade as fetched. `executed_at` stays raw text until the sorter parses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: String,
    pub instrument: String,
    pub direction: Direction,
    pub fees: Decimal,
    pub executed_at: String,
    pub gain: Gain,
}

/// Parse an optional decimal cell; blank text means absent.
pub fn parse_optional_decimal(field: &str, raw: &str) -> Result<Option<Decimal>, WealthlogError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_decimal(field, trimmed).map(Some)
}

pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, WealthlogError> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| WealthlogError::InvalidTrade {
            reason: format!("invalid {field} value {trimmed:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("Long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("SHORT".parse::<Direction>().unwrap(), Direction::Short);
        assert_eq!(" buy ".parse::<Direction>().unwrap(), Direction::Long);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn trade_type_round_trips_query_string() {
        for tt in [TradeType::Fx, TradeType::Stocks, TradeType::Crypto] {
            assert_eq!(tt.as_query_str().parse::<TradeType>().unwrap(), tt);
        }
        assert_eq!("fx".parse::<TradeType>().unwrap(), TradeType::Fx);
        assert!("BONDS".parse::<TradeType>().is_err());
    }

    #[test]
    fn percentage_preferred_over_amount() {
        let gain = Gain {
            amount: Some(dec!(50)),
            percentage: Some(dec!(0.10)),
        };
        assert_eq!(gain.basis(), GainBasis::Percentage(dec!(0.10)));
        assert_eq!(gain.applied_to(dec!(1000)), Some(dec!(100)));
    }

    #[test]
    fn amount_used_when_percentage_absent() {
        let gain = Gain::amount(dec!(-25.5));
        assert_eq!(gain.basis(), GainBasis::Amount(dec!(-25.5)));
        assert_eq!(gain.applied_to(dec!(1000)), Some(dec!(-25.5)));
    }

    #[test]
    fn no_gain_fields_is_zero() {
        let gain = Gain::default();
        assert_eq!(gain.basis(), GainBasis::None);
        assert_eq!(gain.applied_to(dec!(1000)), Some(Decimal::ZERO));
    }

    #[test]
    fn percentage_overflow_yields_none() {
        let gain = Gain::percentage(Decimal::from(1_000_000_000_000i64));
        assert_eq!(gain.applied_to(Decimal::MAX), None);
    }

    #[test]
    fn optional_decimal_blank_is_none() {
        assert_eq!(parse_optional_decimal("fees", "").unwrap(), None);
        assert_eq!(parse_optional_decimal("fees", "   ").unwrap(), None);
        assert_eq!(
            parse_optional_decimal("fees", "12.50").unwrap(),
            Some(dec!(12.50))
        );
    }

    #[test]
    fn decimal_accepts_scientific_notation() {
        assert_eq!(parse_decimal("gain", "5e-2").unwrap(), dec!(0.05));
    }

    #[test]
    fn decimal_rejects_garbage() {
        let err = parse_decimal("fees", "ten").unwrap_err();
        assert!(err.to_string().contains("invalid fees value"));
    }
}
