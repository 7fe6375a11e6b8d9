use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest identifier accepted at the boundary. Door tags and SSCC barcodes
/// stay well below this.
pub const TRACKING_NUMBER_MAX_LENGTH: usize = 40;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Fedex,
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fedex => write!(f, "fedex"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackingNumberError {
    #[error("tracking number must not be empty")]
    Empty,
    #[error("tracking number is {len} characters long, at most {max} are allowed")]
    TooLong { len: usize, max: usize },
}

/// Shipment identifier as handed to a carrier. Opaque past construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    pub fn parse(raw: &str) -> Result<Self, TrackingNumberError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackingNumberError::Empty);
        }

        let len = trimmed.chars().count();
        if len > TRACKING_NUMBER_MAX_LENGTH {
            return Err(TrackingNumberError::TooLong {
                len,
                max: TRACKING_NUMBER_MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
