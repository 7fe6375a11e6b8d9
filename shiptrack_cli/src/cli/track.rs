use anyhow::Context;
use clap::Args;
use shiptrack_carrier::TrackingFacade;

use crate::cli::common::{load_carrier_config, tracking_number};

#[derive(Debug, Args)]
pub(crate) struct TrackCommand {
    /// Defaults to TRACKING_NUMBER_DEFAULT_VALUE.
    number: Option<String>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,
}

impl TrackCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let number = tracking_number(self.number.as_deref())?;
        let config = load_carrier_config()?;
        let facade =
            TrackingFacade::from_config(&config).context("invalid carrier configuration")?;
        log::info!("looking up {number} over {}", facade.protocol());

        let result = facade.lookup(&number).await?;

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{rendered}");
        Ok(())
    }
}
