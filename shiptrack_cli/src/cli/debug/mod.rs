mod token;

use clap::{Args, Subcommand};

use self::token::TokenCommand;

#[derive(Debug, Args)]
pub(crate) struct DebugCommand {
    #[command(subcommand)]
    subcmd: DebugSubcommand,
}

#[derive(Debug, Subcommand)]
enum DebugSubcommand {
    /// Exchange the configured API keys for one bearer token.
    Token(TokenCommand),
}

impl DebugCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        match &self.subcmd {
            DebugSubcommand::Token(cmd) => cmd.run().await,
        }
    }
}
