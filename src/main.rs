use clap::Parser;
use wealthlog::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
