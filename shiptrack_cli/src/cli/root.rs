use clap::{ArgAction, Parser, Subcommand};

use crate::cli::{debug::DebugCommand, track::TrackCommand};

pub(crate) fn get_args() -> CliOpts {
    CliOpts::parse()
}

#[derive(Debug, Parser)]
#[command(name = "shiptrack", version = clap::crate_version!())]
pub(crate) struct CliOpts {
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    subcmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up a tracking number and print the carrier's result.
    Track(TrackCommand),

    /// Debug and operations commands.
    Debug(DebugCommand),
}

impl CliOpts {
    pub(crate) fn verbose(&self) -> u8 {
        self.verbose
    }

    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        match &self.subcmd {
            Command::Track(cmd) => cmd.run().await,
            Command::Debug(cmd) => cmd.run().await,
        }
    }
}
