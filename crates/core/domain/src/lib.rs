pub mod channel;
pub mod measurement;
pub mod value;

pub use channel::{ChannelFunction, ChannelId, ChannelType, DeviceId, UserId};
pub use measurement::{ElectricityMeasurement, PhaseMeasurement};
pub use value::{CHANNEL_VALUE_SIZE, RawValue, RgbwValue, TempHum};
