use serde::{Deserialize, Serialize};
use shiptrack_core::Carrier;

/// Carrier payload for one identifier, passed through without normalisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingResult {
    pub carrier: Carrier,
    pub raw: serde_json::Value,
}
