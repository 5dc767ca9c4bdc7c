/// 设备 RPC 错误。
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("device link closed")]
    Closed,
    #[error("device link busy")]
    Busy,
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

/// 通道写入错误。
///
/// 通道不存在或功能不可写不算错误，由调用方收到 `Ok(false)`。
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
}
