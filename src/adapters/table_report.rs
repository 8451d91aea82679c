//! Ledger rendering: aligned text table and CSV.
//!
//! Columns mirror the trade history screen: Date, Instrument, Direction,
//! Fees, Gain (%), Gain ($), Account Amount.

use std::io::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::account::Account;
use crate::domain::balance::{AnnotatedTrade, Reconstruction};
use crate::domain::error::WealthlogError;
use crate::domain::ledger::Ledger;
use crate::ports::report_port::ReportPort;

pub const HEADERS: [&str; 7] = [
    "Date",
    "Instrument",
    "Direction",
    "Fees",
    "Gain (%)",
    "Gain ($)",
    "Account Amount",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_amount(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.prec$}", rounded, prec = decimals as usize)
}

/// Fraction rendered as a percentage, e.g. 0.05 -> "5.00%".
pub fn format_percentage(fraction: Decimal, decimals: u32) -> Result<String, WealthlogError> {
    let scaled = fraction
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| WealthlogError::Reconstruction {
            reason: format!("percentage {fraction} is out of range"),
        })?;
    Ok(format!("{}%", format_amount(scaled, decimals)))
}

fn row_cells(row: &AnnotatedTrade, decimals: u32) -> Result<[String; 7], WealthlogError> {
    let percentage = match row.trade.gain.percentage {
        Some(p) => format_percentage(p, decimals)?,
        None => "-".to_string(),
    };
    Ok([
        row.executed_at.format(DATE_FORMAT).to_string(),
        row.trade.instrument.clone(),
        row.trade.direction.to_string(),
        format_amount(row.trade.fees, decimals),
        percentage,
        format_amount(row.applied_gain, decimals),
        format_amount(row.balance_after, decimals),
    ])
}

/// Footer label for the stored balance: the fold's start going forward,
/// the latest row's balance going backward.
fn anchor_label(reconstruction: Reconstruction) -> &'static str {
    match reconstruction {
        Reconstruction::Forward => "Seed",
        Reconstruction::Backward => "Stored balance",
    }
}

/// Right-aligned numeric columns, left-aligned text.
pub struct TableReport {
    pub decimals: u32,
}

impl Default for TableReport {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}

impl ReportPort for TableReport {
    fn write(
        &self,
        account: &Account,
        ledger: &Ledger,
        out: &mut dyn Write,
    ) -> Result<(), WealthlogError> {
        writeln!(
            out,
            "{} ({}) - {} trades, balances in {}",
            account.name,
            account.account_type.label(),
            ledger.len(),
            ledger.currency
        )?;

        if ledger.is_empty() {
            writeln!(out, "No trades recorded.")?;
            return Ok(());
        }

        let rows = ledger
            .rows
            .iter()
            .map(|r| row_cells(r, self.decimals))
            .collect::<Result<Vec<_>, _>>()?;

        let mut widths = HEADERS.map(|h| h.len());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let render = |cells: &[&str]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    if i >= 3 {
                        format!("{:>width$}", cell, width = widths[i])
                    } else {
                        format!("{:<width$}", cell, width = widths[i])
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(out, "{}", render(&HEADERS[..]))?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(out, "{}", rule.join("  "))?;
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            writeln!(out, "{}", render(cells.as_slice()))?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "Total fees: {}  Total gain: {}  {}: {} ({})",
            format_amount(ledger.total_fees()?, self.decimals),
            format_amount(ledger.total_gain()?, self.decimals),
            anchor_label(ledger.reconstruction),
            format_amount(ledger.seed_balance, self.decimals),
            ledger.reconstruction
        )?;
        Ok(())
    }
}

/// One CSV record per ledger row, most recent first.
pub struct CsvReport {
    pub decimals: u32,
}

impl Default for CsvReport {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}

impl ReportPort for CsvReport {
    fn write(
        &self,
        _account: &Account,
        ledger: &Ledger,
        out: &mut dyn Write,
    ) -> Result<(), WealthlogError> {
        let mut wtr = csv::Writer::from_writer(out);
        let csv_err = |e: csv::Error| WealthlogError::Io(std::io::Error::other(e));

        wtr.write_record(HEADERS).map_err(csv_err)?;
        for row in &ledger.rows {
            wtr.write_record(row_cells(row, self.decimals)?)
                .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Account listing for the `accounts` command. Missing balances print as "-".
pub fn write_accounts(
    accounts: &[Account],
    decimals: u32,
    out: &mut dyn Write,
) -> Result<(), WealthlogError> {
    if accounts.is_empty() {
        writeln!(out, "No accounts found.")?;
        return Ok(());
    }

    let id_width = accounts.iter().map(|a| a.id.len()).max().unwrap_or(0).max(2);
    let name_width = accounts.iter().map(|a| a.name.chars().count()).max().unwrap_or(0).max(4);
    let balances: Vec<String> = accounts
        .iter()
        .map(|a| {
            a.balance
                .map(|b| format_amount(b, decimals))
                .unwrap_or_else(|| "-".to_string())
        })
        .collect();
    let balance_width = balances.iter().map(String::len).max().unwrap_or(0).max(7);

    writeln!(
        out,
        "{:<id_width$}  {:<name_width$}  {:<11}  {:>balance_width$}  Currency",
        "ID", "Name", "Type", "Balance"
    )?;
    for (account, balance) in accounts.iter().zip(&balances) {
        writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {:<11}  {:>balance_width$}  {}",
            account.id,
            account.name,
            account.account_type.label(),
            balance,
            account.currency
        )?;
    }
    Ok(())
}
