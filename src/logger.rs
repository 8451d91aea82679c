//! Tracing setup for the `wealthlog` binary.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::error::WealthlogError;

const RUST_LOG_ENV: &str = "RUST_LOG";

/// Maps `-v`/`-q` onto a level. Errors stay visible under `--quiet`.
pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init_tracing(level: LevelFilter) -> Result<(), WealthlogError> {
    if level == LevelFilter::OFF {
        return Ok(());
    }

    let mut filter = EnvFilter::new("").add_directive(Directive::from(level));

    // Parse additional log directives from env variable
    if let Some(Ok(env)) = std::env::var_os(RUST_LOG_ENV).map(|s| s.into_string()) {
        for directive in env.split(',').filter(|d| !d.trim().is_empty()) {
            match directive.parse::<Directive>() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("WARN ignoring log directive: `{directive}`: {e}"),
            }
        }
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .boxed();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| WealthlogError::Io(std::io::Error::other(e)))?;

    tracing::debug!(%level, "Initialized logger");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(level_from_flags(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(level_from_flags(0, false), LevelFilter::INFO);
        assert_eq!(level_from_flags(1, false), LevelFilter::DEBUG);
        assert_eq!(level_from_flags(2, false), LevelFilter::TRACE);
        assert_eq!(level_from_flags(9, false), LevelFilter::TRACE);
    }
}
