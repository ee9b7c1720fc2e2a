pub mod device;
pub mod error;
pub mod logging;
pub mod output;
