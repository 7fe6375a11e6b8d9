use async_trait::async_trait;
use shiptrack_core::TrackingNumber;

use crate::{CarrierResult, config::Protocol, types::TrackingResult};

/// One wire protocol's rendition of the tracking lookup.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    async fn lookup(&self, number: &TrackingNumber) -> CarrierResult<TrackingResult>;
}
