use anyhow::Context;
use clap::Args;
use shiptrack_carrier::{AuthProvider, OAuthProvider, ProtocolConfig};
use shiptrack_core::Timestamp;

use crate::cli::common::load_carrier_config;

#[derive(Debug, Args)]
pub(crate) struct TokenCommand {}

impl TokenCommand {
    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let config = load_carrier_config()?;
        config.validate().context("invalid carrier configuration")?;
        let ProtocolConfig::Rest(rest) = &config.protocol else {
            anyhow::bail!("the SOAP service has no bearer token; unset FEDEX_TRACKING_USE_SOAP");
        };

        let http = config
            .http_client()
            .context("failed to build http client")?;
        let auth = OAuthProvider::new(http, config.base_url());
        let credential = auth.authenticate(&rest.keys, rest.version).await?;

        let age = Timestamp::now()
            .signed_duration_since(credential.obtained_at)
            .num_milliseconds();
        println!("API version: {}", rest.version);
        println!("Obtained at: {}", credential.obtained_at);
        println!("Obtained at (epoch): {}", credential.obtained_at.as_epoch_secs());
        println!("Age: {age}ms");
        println!("Token: {}", credential.redacted_token());
        Ok(())
    }
}
