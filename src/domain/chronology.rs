//! Chronological ordering of fetched trades.
//!
//! Parses every `executed_at` up front. A single unparseable timestamp
//! rejects the whole batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::error::WealthlogError;
use super::trade::Trade;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A trade paired with its parsed execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedTrade {
    pub trade: Trade,
    pub executed_at: DateTime<Utc>,
}

/// Parse an execution timestamp. Naive forms are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Sort trades ascending by execution time. Ties keep fetch order.
pub fn sort_chronologically(trades: Vec<Trade>) -> Result<Vec<DatedTrade>, WealthlogError> {
    let mut dated = trades
        .into_iter()
        .map(|trade| match parse_timestamp(&trade.executed_at) {
            Some(executed_at) => Ok(DatedTrade { trade, executed_at }),
            None => Err(WealthlogError::InvalidTimestamp {
                trade_id: trade.id.clone(),
                value: trade.executed_at.clone(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // `sort_by_key` is stable.
    dated.sort_by_key(|d| d.executed_at);
    Ok(dated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{Direction, Gain};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn trade(id: &str, executed_at: &str) -> Trade {
        Trade {
            id: id.into(),
            instrument: "EURUSD".into(),
            direction: Direction::Long,
            fees: Decimal::ZERO,
            executed_at: executed_at.into(),
            gain: Gain::default(),
        }
    }

    fn ids(dated: &[DatedTrade]) -> Vec<&str> {
        dated.iter().map(|d| d.trade.id.as_str()).collect()
    }

    #[test]
    fn parses_rfc3339_with_millis() {
        let dt = parse_timestamp("2024-03-01T10:15:00.000Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn rfc3339_offset_normalised_to_utc() {
        let dt = parse_timestamp("2024-03-01T12:15:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn parses_naive_forms_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01 10:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T10:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 10:15").unwrap(), expected);
    }

    #[test]
    fn date_only_is_midnight() {
        let dt = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_and_blank() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("last tuesday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn sorts_ascending() {
        let sorted = sort_chronologically(vec![
            trade("c", "2024-01-03"),
            trade("a", "2024-01-01"),
            trade("b", "2024-01-02"),
        ])
        .unwrap();
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let sorted = sort_chronologically(vec![
            trade("second", "2024-01-02T09:00:00Z"),
            trade("x", "2024-01-01T09:00:00Z"),
            trade("third", "2024-01-02T09:00:00Z"),
        ])
        .unwrap();
        assert_eq!(ids(&sorted), vec!["x", "second", "third"]);
    }

    #[test]
    fn one_bad_timestamp_rejects_batch() {
        let err = sort_chronologically(vec![
            trade("ok", "2024-01-01"),
            trade("bad", "01/02/2024"),
            trade("ok2", "2024-01-03"),
        ])
        .unwrap_err();
        match err {
            WealthlogError::InvalidTimestamp { trade_id, value } => {
                assert_eq!(trade_id, "bad");
                assert_eq!(value, "01/02/2024");
            }
            other => panic!("expected InvalidTimestamp, got {other}"),
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(sort_chronologically(Vec::new()).unwrap().is_empty());
    }
}
