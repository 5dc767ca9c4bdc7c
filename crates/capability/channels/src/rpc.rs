//! 设备 RPC 协作者：向设备发送“设置通道值”命令。

use crate::error::RpcError;
use async_trait::async_trait;
use domain::{DeviceId, RawValue};
use tokio::sync::mpsc;

/// 发往设备的通道新值命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNewValue {
    pub device_id: DeviceId,
    pub channel_number: i32,
    pub sender_id: i32,
    pub duration_ms: u32,
    pub value: RawValue,
}

/// 设备 RPC 抽象（单向发送，不跟踪应答）。
#[async_trait]
pub trait DeviceRpc: Send + Sync {
    async fn send_set_channel_value(&self, command: ChannelNewValue) -> Result<(), RpcError>;
}

/// 空实现（无设备链路时占位）。
#[derive(Debug, Default)]
pub struct NoopDeviceRpc;

#[async_trait]
impl DeviceRpc for NoopDeviceRpc {
    async fn send_set_channel_value(&self, _command: ChannelNewValue) -> Result<(), RpcError> {
        Ok(())
    }
}

/// 有界队列实现：命令投递给设备链路任务。
#[derive(Debug, Clone)]
pub struct QueuedDeviceRpc {
    sender: mpsc::Sender<ChannelNewValue>,
}

impl QueuedDeviceRpc {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ChannelNewValue>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DeviceRpc for QueuedDeviceRpc {
    async fn send_set_channel_value(&self, command: ChannelNewValue) -> Result<(), RpcError> {
        self.sender.try_send(command).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => RpcError::Busy,
            mpsc::error::TrySendError::Closed(_) => RpcError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> ChannelNewValue {
        ChannelNewValue {
            device_id: 1,
            channel_number: 0,
            sender_id: 7,
            duration_ms: 0,
            value: [1, 0, 0, 0, 0, 0, 0, 0],
        }
    }

    #[tokio::test]
    async fn queued_rpc_reports_full_and_closed_links() {
        let (rpc, mut receiver) = QueuedDeviceRpc::new(1);
        rpc.send_set_channel_value(command()).await.expect("first");
        assert!(matches!(
            rpc.send_set_channel_value(command()).await,
            Err(RpcError::Busy)
        ));
        assert_eq!(receiver.recv().await, Some(command()));

        drop(receiver);
        assert!(matches!(
            rpc.send_set_channel_value(command()).await,
            Err(RpcError::Closed)
        ));
    }
}
