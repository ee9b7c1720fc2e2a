pub mod constants;
pub mod device;
pub mod error;
pub mod estimator;
pub mod framer;
pub mod packet;
pub mod rolling;

// Re-export the Headset struct for easy access
pub use device::{CommitPolicy, Headset, HeadsetConfig, LinkStats, Telemetry};
pub use error::TGError;
