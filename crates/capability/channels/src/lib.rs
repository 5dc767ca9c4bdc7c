//! 设备通道状态层：通道注册表、设备目录与设备 RPC 协作者。

pub mod channel;
pub mod directory;
pub mod error;
pub mod registry;
pub mod rpc;

pub use channel::DeviceChannel;
pub use directory::DeviceDirectory;
pub use error::{ChannelError, RpcError};
pub use registry::ChannelRegistry;
pub use rpc::{ChannelNewValue, DeviceRpc, NoopDeviceRpc, QueuedDeviceRpc};
