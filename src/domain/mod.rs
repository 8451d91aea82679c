//! Core domain types and logic.

pub mod account;
pub mod balance;
pub mod chronology;
pub mod config_validation;
pub mod error;
pub mod ledger;
pub mod session;
pub mod trade;
