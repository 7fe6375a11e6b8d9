use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::{Value, json};
use shiptrack_core::{Carrier, TrackingNumber};

use crate::{
    CarrierError, CarrierResult,
    adapter::ProtocolAdapter,
    auth::{AuthProvider, Credential},
    config::{ApiVersion, Protocol, RestConfig},
    credential_cache::{CachedCredential, CredentialCache},
    errors::{Cause, ProtocolFailure},
    types::TrackingResult,
};

/// Where a lookup stands with respect to the one allowed credential refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RetryStage {
    FirstAttempt,
    Refreshed,
}

/// JSON tracking API with bearer authentication.
pub struct RestAdapter {
    http: reqwest::Client,
    base_url: String,
    config: RestConfig,
    auth: Arc<dyn AuthProvider>,
    cache: Arc<CredentialCache>,
}

impl RestAdapter {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        config: RestConfig,
        auth: Arc<dyn AuthProvider>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            config,
            auth,
            cache,
        }
    }

    async fn lease(&self) -> CarrierResult<CachedCredential> {
        self.cache
            .get_or_refresh(|| self.auth.authenticate(&self.config.keys, self.config.version))
            .await
    }

    async fn send(
        &self,
        url: &str,
        body: &Value,
        credential: &Credential,
    ) -> CarrierResult<reqwest::Response> {
        log::trace!("POST {url}");
        self.http
            .post(url)
            .header(AUTHORIZATION, credential.bearer_header())
            .json(body)
            .send()
            .await
            .map_err(|err| CarrierError::transport("tracking request could not be sent", err))
    }
}

#[async_trait]
impl ProtocolAdapter for RestAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    async fn lookup(&self, number: &TrackingNumber) -> CarrierResult<TrackingResult> {
        let url = format!("{}{}", self.base_url, self.config.version.tracking_path());
        let body = tracking_request_body(self.config.version, number);
        let mut stage = RetryStage::FirstAttempt;

        loop {
            let lease = self.lease().await?;
            let response = self.send(&url, &body, &lease.credential).await?;
            let status = response.status();
            let text = response.text().await.map_err(|err| {
                CarrierError::transport("tracking response could not be read", err)
            })?;

            if status != StatusCode::UNAUTHORIZED {
                let raw = extract_output(status, text)?;
                return Ok(TrackingResult {
                    carrier: Carrier::Fedex,
                    raw,
                });
            }

            let rejected = Cause::Status {
                status: status.as_u16(),
                body: text,
            };
            match stage {
                RetryStage::FirstAttempt if !lease.fresh => {
                    log::debug!(
                        "credential generation {} rejected, refreshing once",
                        lease.generation
                    );
                    self.cache.invalidate_generation(lease.generation);
                    stage = RetryStage::Refreshed;
                }
                RetryStage::FirstAttempt => {
                    log::warn!("freshly issued credential rejected for {number}");
                    return Err(CarrierError::auth(
                        "freshly issued credential was rejected",
                        rejected,
                    ));
                }
                RetryStage::Refreshed => {
                    log::warn!("refreshed credential rejected for {number}");
                    return Err(CarrierError::auth(
                        "credential rejected again after refresh",
                        rejected,
                    ));
                }
            }
        }
    }
}

fn tracking_request_body(version: ApiVersion, number: &TrackingNumber) -> Value {
    match version {
        ApiVersion::V1 => json!({
            "trackingInfo": [
                { "trackingNumberInfo": { "trackingNumber": number.as_str() } }
            ],
            "includeDetailedScans": true
        }),
        ApiVersion::V2 => json!({
            "appDeviceType": "WTRK",
            "appType": "WTRK",
            "supportCurrentLocation": true,
            "trackingInfo": [{
                "trackNumberInfo": {
                    "trackingCarrier": "",
                    "trackingNumber": number.as_str(),
                    "trackingQualifier": ""
                }
            }],
            "uniqueKey": "",
            "guestAuthenticationToken": ""
        }),
    }
}

fn extract_output(status: StatusCode, body: String) -> CarrierResult<Value> {
    if !status.is_success() {
        log::warn!("tracking endpoint responded with status {status}");
        return Err(CarrierError::transport(
            "tracking endpoint returned an error status",
            Cause::Status {
                status: status.as_u16(),
                body,
            },
        ));
    }

    let value: Value = serde_json::from_str(&body).map_err(|err| {
        CarrierError::upstream(
            ProtocolFailure::MalformedBody,
            "tracking response is not valid json",
            err,
        )
    })?;

    let output = match value {
        Value::Object(mut fields) => fields.remove("output"),
        _ => None,
    };

    output.ok_or_else(|| {
        CarrierError::upstream(
            ProtocolFailure::MissingField,
            "tracking response has no output",
            Cause::MissingField("output"),
        )
    })
}
