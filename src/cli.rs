//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::table_report::{CsvReport, TableReport, write_accounts};
use crate::domain::account::{Account, find_account};
use crate::domain::balance::Reconstruction;
use crate::domain::config_validation::{
    ReportFormat, SourceKind, resolve_decimals, resolve_report_format, resolve_reconstruction,
    resolve_trade_type_override, validate_config, validate_source_config,
};
use crate::domain::error::WealthlogError;
use crate::domain::ledger::{Ledger, build_ledger};
use crate::domain::session::{ACCESS_TOKEN_ENV, SessionContext};
use crate::domain::trade::TradeType;
use crate::logger;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::trade_port::LedgerSource;

#[derive(Parser, Debug)]
#[command(name = "wealthlog", about = "Trade ledger with reconstructed account balances")]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an account's trades with the balance after each one
    Ledger {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        account: String,
        /// FX, STOCKS or CRYPTO; defaults to the account's own type
        #[arg(long)]
        trade_type: Option<TradeType>,
        /// table or csv
        #[arg(short, long)]
        format: Option<ReportFormat>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Treat the stored balance as the balance after the latest trade
        #[arg(long)]
        backward: bool,
    },
    /// List accounts with their stored balances
    Accounts {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load accounts and trades (CSV or JSON) into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        accounts: Option<PathBuf>,
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = logger::init_tracing(logger::level_from_flags(cli.verbose, cli.quiet)) {
        eprintln!("warning: logging disabled: {e}");
    }

    match cli.command {
        Command::Ledger {
            config,
            account,
            trade_type,
            format,
            output,
            backward,
        } => run_ledger(
            &config,
            &account,
            trade_type,
            format,
            output.as_deref(),
            backward,
        ),
        Command::Accounts { config } => run_accounts(&config),
        Command::Import {
            config,
            accounts,
            trades,
        } => run_import(&config, accounts.as_deref(), trades.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    tracing::info!(path = %path.display(), "Loading config");
    FileConfigAdapter::from_file(path).map_err(|e| {
        tracing::error!("{e}");
        ExitCode::from(&e)
    })
}

fn load_validated_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let config = load_config(path)?;
    validate_config(&config).map_err(|e| {
        tracing::error!("{e}");
        ExitCode::from(&e)
    })?;
    Ok(config)
}

#[cfg(not(all(feature = "sqlite", feature = "postgres", feature = "http")))]
fn feature_disabled(kind: SourceKind) -> WealthlogError {
    WealthlogError::ConfigInvalid {
        section: "source".into(),
        key: "kind".into(),
        reason: format!("wealthlog was built without the {} feature", kind.as_str()),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    Err(feature_disabled(SourceKind::Sqlite))
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    use crate::adapters::postgres_adapter::PostgresAdapter;

    Ok(Box::new(PostgresAdapter::from_config(config)?))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    Err(feature_disabled(SourceKind::Postgres))
}

#[cfg(feature = "http")]
fn open_http(config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    use crate::adapters::rest_adapter::RestAdapter;

    let session = session_from(config);
    if !session.is_authenticated() {
        tracing::warn!("No access token configured; requests are sent without authorization");
    }
    Ok(Box::new(RestAdapter::from_config(config, session)?))
}

#[cfg(not(feature = "http"))]
fn open_http(_config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    Err(feature_disabled(SourceKind::Http))
}

/// Builds the adapter named by `[source] kind`.
pub fn open_source(config: &dyn ConfigPort) -> Result<Box<dyn LedgerSource>, WealthlogError> {
    let kind = validate_source_config(config)?;
    tracing::debug!(kind = kind.as_str(), "Opening trade source");
    match kind {
        SourceKind::Csv => Ok(Box::new(CsvAdapter::from_config(config)?)),
        SourceKind::Sqlite => open_sqlite(config),
        SourceKind::Postgres => open_postgres(config),
        SourceKind::Http => open_http(config),
    }
}

/// `[session] access_token`, overridden by a non-blank env token.
pub fn resolve_session(config: &dyn ConfigPort, env_token: Option<String>) -> SessionContext {
    let mut session = SessionContext::anonymous();
    if let Some(token) = config.get_trimmed("session", "access_token") {
        session.login(token);
    }
    if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
        session.login(token);
    }
    session
}

pub fn session_from(config: &dyn ConfigPort) -> SessionContext {
    resolve_session(config, std::env::var(ACCESS_TOKEN_ENV).ok())
}

/// Flag first, then `[ledger] trade_type`, then the account's own type.
pub fn resolve_trade_type(
    flag: Option<TradeType>,
    config_override: Option<TradeType>,
    account: &Account,
) -> Result<TradeType, WealthlogError> {
    flag.or(config_override)
        .or_else(|| account.account_type.trade_type())
        .ok_or_else(|| WealthlogError::ConfigMissing {
            section: "ledger".into(),
            key: "trade_type".into(),
        })
}

#[derive(Debug, Clone)]
pub struct LedgerRequest {
    pub account_id: String,
    pub trade_type: Option<TradeType>,
    pub reconstruction: Reconstruction,
}

/// Account lookup, trade fetch and reconstruction. Each failing stage is
/// logged with its own context before the error is returned.
pub fn run_ledger_pipeline(
    source: &dyn LedgerSource,
    request: &LedgerRequest,
) -> Result<(Account, Ledger), WealthlogError> {
    let accounts = source
        .list_accounts()
        .inspect_err(|e| tracing::error!("failed to load accounts: {e}"))?;
    let account = find_account(&accounts, &request.account_id)
        .inspect_err(|e| tracing::error!("{e}"))?
        .clone();

    let trade_type = resolve_trade_type(request.trade_type, None, &account)
        .inspect_err(|e| tracing::error!("cannot pick a trade type for {}: {e}", account.id))?;

    tracing::info!(account = %account.id, %trade_type, "Loading trades");
    let trades = source
        .fetch_trades(&account.id, trade_type)
        .inspect_err(|e| tracing::error!("failed to load trades: {e}"))?;

    let ledger = build_ledger(&account, trades, request.reconstruction)
        .inspect_err(|e| tracing::error!("failed to reconstruct balances: {e}"))?;

    Ok((account, ledger))
}

pub fn report_for(format: ReportFormat, decimals: u32) -> Box<dyn ReportPort> {
    match format {
        ReportFormat::Table => Box::new(TableReport { decimals }),
        ReportFormat::Csv => Box::new(CsvReport { decimals }),
    }
}

/// Writes to `output` when given, stdout otherwise.
pub fn write_report(
    report: &dyn ReportPort,
    account: &Account,
    ledger: &Ledger,
    output: Option<&Path>,
) -> Result<(), WealthlogError> {
    match output {
        Some(path) => {
            let mut out = BufWriter::new(fs::File::create(path)?);
            report.write(account, ledger, &mut out)?;
            out.flush()?;
            tracing::info!(path = %path.display(), rows = ledger.len(), "Wrote ledger");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report.write(account, ledger, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

type LedgerSettings = (Reconstruction, Option<TradeType>, ReportFormat, u32);

fn ledger_settings(config: &dyn ConfigPort) -> Result<LedgerSettings, WealthlogError> {
    Ok((
        resolve_reconstruction(config)?,
        resolve_trade_type_override(config)?,
        resolve_report_format(config)?,
        resolve_decimals(config)?,
    ))
}

fn run_ledger(
    config_path: &Path,
    account_id: &str,
    trade_type_flag: Option<TradeType>,
    format_flag: Option<ReportFormat>,
    output: Option<&Path>,
    backward: bool,
) -> ExitCode {
    let config = match load_validated_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (reconstruction, trade_type_override, format, decimals) = match ledger_settings(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e}");
            return (&e).into();
        }
    };

    let source = match open_source(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to open trade source: {e}");
            return (&e).into();
        }
    };

    let request = LedgerRequest {
        account_id: account_id.to_string(),
        trade_type: trade_type_flag.or(trade_type_override),
        reconstruction: if backward {
            Reconstruction::Backward
        } else {
            reconstruction
        },
    };

    let (account, ledger) = match run_ledger_pipeline(&*source, &request) {
        Ok(result) => result,
        Err(e) => return (&e).into(),
    };

    let report = report_for(format_flag.unwrap_or(format), decimals);
    match write_report(report.as_ref(), &account, &ledger, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("failed to write report: {e}");
            (&e).into()
        }
    }
}

fn run_accounts(config_path: &Path) -> ExitCode {
    let config = match load_validated_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let decimals = match resolve_decimals(&config) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("{e}");
            return (&e).into();
        }
    };

    let result = open_source(&config)
        .inspect_err(|e| tracing::error!("failed to open trade source: {e}"))
        .and_then(|source| {
            source
                .list_accounts()
                .inspect_err(|e| tracing::error!("failed to load accounts: {e}"))
        })
        .and_then(|accounts| {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_accounts(&accounts, decimals, &mut out)
                .inspect_err(|e| tracing::error!("failed to write accounts: {e}"))
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => (&e).into(),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_validated_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match validate_source_config(&config) {
        Ok(kind) => {
            println!(
                "{}: configuration is valid ({} source)",
                config_path.display(),
                kind.as_str()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

#[cfg(feature = "sqlite")]
pub use import::{ImportSummary, import_files};

#[cfg(feature = "sqlite")]
mod import {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    use crate::adapters::csv_adapter::{open_reader, read_account_rows, read_trade_rows};
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::adapters::wire;
    use crate::domain::account::Account;
    use crate::domain::error::WealthlogError;
    use crate::domain::trade::{Trade, TradeType};

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ImportSummary {
        pub accounts: usize,
        pub trades: usize,
    }

    fn is_json(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }

    fn read_accounts(path: &Path) -> Result<Vec<Account>, WealthlogError> {
        if is_json(path) {
            wire::parse_accounts(&fs::read_to_string(path)?)
        } else {
            read_account_rows(&mut open_reader(path)?)
        }
    }

    type TradeGroups = HashMap<(String, TradeType), Vec<Trade>>;

    fn read_trades(path: &Path) -> Result<TradeGroups, WealthlogError> {
        let mut groups = TradeGroups::new();

        if is_json(path) {
            for wire_trade in wire::parse_trades(&fs::read_to_string(path)?)? {
                let id = String::from(wire_trade.id.clone());
                let missing = |field: &str| WealthlogError::InvalidTrade {
                    reason: format!("trade {id} has no {field}"),
                };
                let account_id = wire_trade.account_id().ok_or_else(|| missing("accountId"))?;
                let trade_type: TradeType = wire_trade
                    .trade_type
                    .as_deref()
                    .ok_or_else(|| missing("tradeType"))?
                    .parse()?;
                groups
                    .entry((account_id, trade_type))
                    .or_default()
                    .push(wire_trade.into_trade()?);
            }
        } else {
            for row in read_trade_rows(&mut open_reader(path)?)? {
                let trade_type: TradeType = row.trade_type.parse()?;
                let account_id = row.account_id.clone();
                groups
                    .entry((account_id, trade_type))
                    .or_default()
                    .push(row.into_trade()?);
            }
        }

        Ok(groups)
    }

    /// Files ending in `.json` use the API's wire shape, anything else is
    /// read as CSV. Nothing is written unless every record parses, and the
    /// write itself is a single transaction.
    pub fn import_files(
        store: &SqliteAdapter,
        accounts: Option<&Path>,
        trades: Option<&Path>,
    ) -> Result<ImportSummary, WealthlogError> {
        let accounts = accounts.map(read_accounts).transpose()?.unwrap_or_default();
        let groups = trades.map(read_trades).transpose()?.unwrap_or_default();

        store.initialize_schema()?;
        let batches = groups
            .iter()
            .map(|((account_id, trade_type), group)| (account_id.as_str(), *trade_type, group.as_slice()));
        let trades = store.import(&accounts, batches)?;

        Ok(ImportSummary {
            accounts: accounts.len(),
            trades,
        })
    }
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, accounts: Option<&Path>, trades: Option<&Path>) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    if accounts.is_none() && trades.is_none() {
        tracing::error!("nothing to import: pass --accounts and/or --trades");
        return ExitCode::from(2);
    }

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match SqliteAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to open SQLite store: {e}");
            return (&e).into();
        }
    };

    match import_files(&store, accounts, trades) {
        Ok(summary) => {
            tracing::info!(
                accounts = summary.accounts,
                trades = summary.trades,
                "Import complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("import failed: {e}");
            (&e).into()
        }
    }
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _accounts: Option<&Path>, _trades: Option<&Path>) -> ExitCode {
    let err = feature_disabled(SourceKind::Sqlite);
    tracing::error!("{err}");
    (&err).into()
}
