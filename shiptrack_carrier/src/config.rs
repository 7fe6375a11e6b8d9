use std::{fmt, time::Duration};

use crate::errors::ConfigError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    pub fn token_path(self) -> &'static str {
        match self {
            Self::V1 => "/oauth/token",
            Self::V2 => "/auth/oauth/v2/token",
        }
    }

    pub fn tracking_path(self) -> &'static str {
        match self {
            Self::V1 => "/track/v1/trackingnumbers",
            Self::V2 => "/track/v2/shipments",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            _ => Err(ConfigError::Invalid("api version must be v1 or v2")),
        }
    }
}

/// Long-lived key pair exchanged for bearer tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeys {
    pub api_key: String,
    pub secret_key: String,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestConfig {
    pub keys: ApiKeys,
    pub version: ApiVersion,
}

#[derive(Clone, PartialEq, Eq)]
pub struct KeyPassword {
    pub key: String,
    pub password: String,
}

impl fmt::Debug for KeyPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPassword")
            .field("key", &self.key)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoapVersion {
    pub major: u32,
    pub intermediate: u32,
    pub minor: u32,
}

/// Static authentication block sent with every SOAP call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoapCredentials {
    pub parent: KeyPassword,
    pub user: KeyPassword,
    pub account_number: String,
    pub meter_number: String,
    pub version: SoapVersion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoapConfig {
    pub endpoint: String,
    pub credentials: SoapCredentials,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolConfig {
    Rest(RestConfig),
    Soap(SoapConfig),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Rest,
    Soap,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => write!(f, "rest"),
            Self::Soap => write!(f, "soap"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarrierConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub protocol: ProtocolConfig,
}

impl CarrierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("FEDEX_URL must be set"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request timeout must be non-zero"));
        }

        match &self.protocol {
            ProtocolConfig::Rest(rest) => {
                if rest.keys.api_key.trim().is_empty() {
                    return Err(ConfigError::Invalid("FEDEX_TRACKING_API_KEY must be set"));
                }
                if rest.keys.secret_key.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "FEDEX_TRACKING_SECRET_KEY must be set",
                    ));
                }
            }
            ProtocolConfig::Soap(soap) => {
                if soap.endpoint.trim().is_empty() {
                    return Err(ConfigError::Invalid("soap endpoint must be set"));
                }
                let creds = &soap.credentials;
                if creds.parent.key.trim().is_empty() || creds.user.key.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "soap parent and user keys must be set",
                    ));
                }
                if creds.account_number.trim().is_empty() || creds.meter_number.trim().is_empty()
                {
                    return Err(ConfigError::Invalid(
                        "soap account and meter numbers must be set",
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn protocol(&self) -> Protocol {
        match self.protocol {
            ProtocolConfig::Rest(_) => Protocol::Rest,
            ProtocolConfig::Soap(_) => Protocol::Soap,
        }
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("shiptrack/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }
}
