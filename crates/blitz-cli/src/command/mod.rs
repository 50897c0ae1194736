use blitz_engine::MatchConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{serve::ServeArg, simulate::SimulateArg};

mod serve;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Serve matches over line-delimited JSON on TCP
    Serve(#[clap(flatten)] ServeArg),
    /// Play scripted opponents against each other and summarize the results
    Simulate(#[clap(flatten)] SimulateArg),
}

/// Grid and base limit shared by every match the command runs.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MatchConfigArg {
    /// Number of grid rows
    #[arg(long, default_value_t = MatchConfig::default().rows)]
    rows: usize,
    /// Number of grid columns
    #[arg(long, default_value_t = MatchConfig::default().cols)]
    cols: usize,
    /// Bases each player places before battle
    #[arg(long, default_value_t = MatchConfig::DEFAULT_MAX_BASES)]
    max_bases: usize,
}

impl MatchConfigArg {
    pub(crate) fn to_config(&self) -> anyhow::Result<MatchConfig> {
        Ok(MatchConfig::new(self.rows, self.cols, self.max_bases)?)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing();
    match args.mode {
        Mode::Serve(arg) => serve::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}

/// Logs go to stderr so that JSON written to stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
