use async_trait::async_trait;
use shiptrack_core::Timestamp;

use super::types::Credential;
use crate::{
    CarrierError, CarrierResult,
    config::{ApiKeys, ApiVersion},
    errors::Cause,
};

/// Exchanges long-lived API keys for a bearer credential.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, keys: &ApiKeys, version: ApiVersion)
    -> CarrierResult<Credential>;
}

/// OAuth client-credentials exchange against the carrier's token endpoint.
#[derive(Clone, Debug)]
pub struct OAuthProvider {
    http: reqwest::Client,
    base_url: String,
}

impl OAuthProvider {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn token_url(&self, version: ApiVersion) -> String {
        format!("{}{}", self.base_url, version.token_path())
    }
}

#[async_trait]
impl AuthProvider for OAuthProvider {
    async fn authenticate(
        &self,
        keys: &ApiKeys,
        version: ApiVersion,
    ) -> CarrierResult<Credential> {
        let url = self.token_url(version);
        log::debug!("requesting bearer token from {url}");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", keys.api_key.as_str()),
            ("client_secret", keys.secret_key.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|err| CarrierError::auth("token request could not be sent", err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CarrierError::auth("token response could not be read", err))?;

        if !status.is_success() {
            log::warn!("token endpoint rejected credentials with status {status}");
            return Err(CarrierError::auth(
                "token endpoint rejected the api keys",
                Cause::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        parse_access_token(&body).map(|token| Credential::new(token, Timestamp::now()))
    }
}

fn parse_access_token(body: &str) -> CarrierResult<String> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|err| CarrierError::auth("token response is not valid json", err))?;

    value
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            CarrierError::auth(
                "token response has no access token",
                Cause::MissingField("access_token"),
            )
        })
}
