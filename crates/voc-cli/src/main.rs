use anyhow::Result;
use clap::Parser;

mod cli;
mod io;
mod run;

use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().format_timestamp_secs().init();

    let cli = Cli::parse();
    run::run(&cli)
}
