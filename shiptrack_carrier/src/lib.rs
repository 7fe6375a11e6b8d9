pub mod adapter;
pub mod auth;
pub mod config;
pub mod credential_cache;
pub mod errors;
pub mod facade;
pub mod rest;
pub mod soap;
pub mod types;

pub use adapter::ProtocolAdapter;
pub use auth::{AuthProvider, Credential, OAuthProvider};
pub use config::{
    ApiKeys, ApiVersion, CarrierConfig, DEFAULT_REQUEST_TIMEOUT, KeyPassword, Protocol,
    ProtocolConfig, RestConfig, SoapConfig, SoapCredentials, SoapVersion,
};
pub use credential_cache::{CachedCredential, CredentialCache};
pub use errors::{CarrierError, CarrierResult, Cause, ConfigError, ErrorKind, ProtocolFailure};
pub use facade::TrackingFacade;
pub use rest::RestAdapter;
pub use shiptrack_core::{Carrier, TrackingNumber};
pub use soap::SoapAdapter;
pub use types::TrackingResult;
