use std::sync::Arc;

use shiptrack_core::TrackingNumber;

use crate::{
    CarrierResult,
    adapter::ProtocolAdapter,
    auth::{AuthProvider, OAuthProvider},
    config::{CarrierConfig, Protocol, ProtocolConfig},
    credential_cache::CredentialCache,
    errors::ConfigError,
    rest::RestAdapter,
    soap::SoapAdapter,
    types::TrackingResult,
};

/// The single lookup entry point. The protocol is fixed at construction.
pub struct TrackingFacade {
    adapter: Box<dyn ProtocolAdapter>,
}

impl TrackingFacade {
    pub fn from_config(config: &CarrierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = config.http_client()?;

        let adapter: Box<dyn ProtocolAdapter> = match &config.protocol {
            ProtocolConfig::Rest(rest) => {
                let auth: Arc<dyn AuthProvider> =
                    Arc::new(OAuthProvider::new(http.clone(), config.base_url()));
                Box::new(RestAdapter::new(
                    http,
                    config.base_url(),
                    rest.clone(),
                    auth,
                    Arc::new(CredentialCache::new()),
                ))
            }
            ProtocolConfig::Soap(soap) => Box::new(SoapAdapter::new(http, soap)),
        };

        log::debug!("tracking facade using {} protocol", adapter.protocol());
        Ok(Self { adapter })
    }

    pub fn with_adapter(adapter: Box<dyn ProtocolAdapter>) -> Self {
        Self { adapter }
    }

    pub fn protocol(&self) -> Protocol {
        self.adapter.protocol()
    }

    pub async fn lookup(&self, number: &TrackingNumber) -> CarrierResult<TrackingResult> {
        self.adapter.lookup(number).await
    }
}
