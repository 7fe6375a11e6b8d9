pub mod ids;
pub mod time;

pub use ids::{Carrier, TRACKING_NUMBER_MAX_LENGTH, TrackingNumber, TrackingNumberError};
pub use time::Timestamp;
