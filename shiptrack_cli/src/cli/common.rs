use std::{env, time::Duration};

use anyhow::Context;
use shiptrack_carrier::{
    ApiKeys, ApiVersion, CarrierConfig, DEFAULT_REQUEST_TIMEOUT, KeyPassword, ProtocolConfig,
    RestConfig, SoapConfig, SoapCredentials, SoapVersion,
};
use shiptrack_core::TrackingNumber;

const DEFAULT_SOAP_PATH: &str = "/web-services/track";

pub(crate) fn load_carrier_config() -> anyhow::Result<CarrierConfig> {
    carrier_config_from(&|name| env::var(name).ok())
}

/// Explicit argument first, then `TRACKING_NUMBER_DEFAULT_VALUE`.
pub(crate) fn tracking_number(explicit: Option<&str>) -> anyhow::Result<TrackingNumber> {
    let raw = match explicit {
        Some(raw) => raw.to_owned(),
        None => env::var("TRACKING_NUMBER_DEFAULT_VALUE").context(
            "tracking number is required; pass one or set TRACKING_NUMBER_DEFAULT_VALUE",
        )?,
    };
    TrackingNumber::parse(&raw).with_context(|| format!("invalid tracking number `{raw}`"))
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn carrier_config_from(lookup: Lookup<'_>) -> anyhow::Result<CarrierConfig> {
    // Production and sandbox deployments use distinct variable names.
    let production = flag(lookup, "PRODUCTION");
    let name = |prod: &'static str, sandbox: &'static str| if production { prod } else { sandbox };

    let base_url = required(lookup, name("FEDEX_URL", "FEDEX_SANDBOX_URL"))?;
    let request_timeout = match lookup("SHIPTRACK_TIMEOUT_SECS") {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("SHIPTRACK_TIMEOUT_SECS is not a number: `{raw}`"))?,
        None => DEFAULT_REQUEST_TIMEOUT,
    };

    let protocol = if flag(lookup, "FEDEX_TRACKING_USE_SOAP") {
        ProtocolConfig::Soap(soap_config_from(lookup, &base_url)?)
    } else {
        let version = match lookup("FEDEX_TRACKING_API_VERSION") {
            Some(raw) => raw.parse::<ApiVersion>()?,
            None => ApiVersion::default(),
        };
        ProtocolConfig::Rest(RestConfig {
            keys: ApiKeys {
                api_key: required(
                    lookup,
                    name("FEDEX_TRACKING_API_KEY", "FEDEX_TRACKING_SANDBOX_API_KEY"),
                )?,
                secret_key: required(
                    lookup,
                    name(
                        "FEDEX_TRACKING_SECRET_KEY",
                        "FEDEX_TRACKING_SANDBOX_SECRET_KEY",
                    ),
                )?,
            },
            version,
        })
    };

    let config = CarrierConfig {
        base_url,
        request_timeout,
        protocol,
    };
    log::debug!("loaded carrier config: {config:?}");
    Ok(config)
}

fn soap_config_from(lookup: Lookup<'_>, base_url: &str) -> anyhow::Result<SoapConfig> {
    let endpoint = lookup("FEDEX_TRACKING_SOAP_ENDPOINT").unwrap_or_else(|| {
        format!("{}{DEFAULT_SOAP_PATH}", base_url.trim_end_matches('/'))
    });

    Ok(SoapConfig {
        endpoint,
        credentials: SoapCredentials {
            parent: KeyPassword {
                key: required(lookup, "FEDEX_TRACKING_SOAP_PARENT_KEY")?,
                password: required(lookup, "FEDEX_TRACKING_SOAP_PARENT_PASSWORD")?,
            },
            user: KeyPassword {
                key: required(lookup, "FEDEX_TRACKING_SOAP_USER_KEY")?,
                password: required(lookup, "FEDEX_TRACKING_SOAP_USER_PASSWORD")?,
            },
            account_number: required(lookup, "FEDEX_TRACKING_SOAP_CLIENT_ACCOUNT")?,
            meter_number: required(lookup, "FEDEX_TRACKING_SOAP_CLIENT_METER")?,
            version: SoapVersion {
                major: required_number(lookup, "FEDEX_TRACKING_SOAP_VERSION_MAJOR")?,
                intermediate: required_number(lookup, "FEDEX_TRACKING_SOAP_VERSION_MIDDLE")?,
                minor: required_number(lookup, "FEDEX_TRACKING_SOAP_VERSION_MINOR")?,
            },
        },
    })
}

fn required(lookup: Lookup<'_>, name: &str) -> anyhow::Result<String> {
    lookup(name).ok_or_else(|| anyhow::anyhow!("missing required env var `{name}`"))
}

fn required_number(lookup: Lookup<'_>, name: &str) -> anyhow::Result<u32> {
    let raw = required(lookup, name)?;
    raw.trim()
        .parse()
        .with_context(|| format!("env var `{name}` is not a number: `{raw}`"))
}

/// `1` or `true` enable a flag; anything else, or unset, leaves it off.
fn flag(lookup: Lookup<'_>, name: &str) -> bool {
    lookup(name)
        .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}
