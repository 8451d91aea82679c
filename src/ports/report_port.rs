//! Ledger report port trait.

use std::io::Write;

use crate::domain::account::Account;
use crate::domain::error::WealthlogError;
use crate::domain::ledger::Ledger;

/// Port for rendering a ledger.
pub trait ReportPort {
    fn write(
        &self,
        account: &Account,
        ledger: &Ledger,
        out: &mut dyn Write,
    ) -> Result<(), WealthlogError>;

    /// Default implementation: renders into memory via `write`.
    fn render(&self, account: &Account, ledger: &Ledger) -> Result<String, WealthlogError> {
        let mut buf = Vec::new();
        self.write(account, ledger, &mut buf)?;
        String::from_utf8(buf).map_err(|e| WealthlogError::Io(std::io::Error::other(e)))
    }
}
