//! Handlers 模块

pub mod channels;
pub mod devices;
pub mod health;
pub mod metrics;
pub mod mqtt;

pub use channels::*;
pub use devices::*;
pub use health::*;
pub use metrics::*;
pub use mqtt::*;
