//! 设备链路占位：消费写入命令队列。
//!
//! 设备通信协议不在本服务内实现；命令在这里记录后丢弃。

use hub_channels::ChannelNewValue;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(mut commands: mpsc::Receiver<ChannelNewValue>) {
    while let Some(command) = commands.recv().await {
        info!(
            target: "hub.server",
            device_id = command.device_id,
            channel_number = command.channel_number,
            sender_id = command.sender_id,
            duration_ms = command.duration_ms,
            value = ?command.value,
            "device_command_forwarded"
        );
    }
    info!(target: "hub.server", "device_link_closed");
}
