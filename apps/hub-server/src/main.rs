//! 通道状态服务：加载设备目录，启动 MQTT 发布器与运维 HTTP 接口。

mod device_link;
mod handlers;
mod middleware;
mod routes;
mod utils;

use axum::Router;
use hub_channels::{DeviceDirectory, QueuedDeviceRpc};
use hub_config::{AppConfig, MqttConfig};
use hub_mqtt::{
    EnabledUserSet, MqttPublisher, MqttTransport, PublisherDataSource,
    PublisherHandle, RumqttTransport, RumqttTransportConfig, spawn_inbound_listener,
    spawn_publisher,
};
use hub_storage::{PgChannelSource, PgMqttDataStore, connect_pool};
use hub_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

const DEVICE_COMMAND_QUEUE: usize = 128;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DeviceDirectory>,
    /// MQTT 关闭时为 `None`。
    pub publisher: Option<PublisherHandle>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let pool = connect_pool(&config.database_url).await?;

    // 设备命令队列：写入请求经由该队列交给设备链路
    let (rpc, commands) = QueuedDeviceRpc::new(DEVICE_COMMAND_QUEUE);
    tokio::spawn(device_link::run(commands));

    let directory = Arc::new(DeviceDirectory::new(Arc::new(rpc)));
    let source = PgChannelSource::new(pool.clone());
    directory.load(&source).await?;

    let publisher = if config.mqtt.enabled {
        let store = Arc::new(PgMqttDataStore::new(pool));
        Some(start_publisher(&config.mqtt, store, directory.clone()))
    } else {
        info!(target: "hub.server", "mqtt_disabled");
        None
    };

    let state = AppState {
        directory,
        publisher,
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "hub.server", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(state: AppState) -> Router {
    routes::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(axum::middleware::from_fn(middleware::request_context))
}

fn start_publisher(
    config: &MqttConfig,
    store: Arc<PgMqttDataStore>,
    directory: Arc<DeviceDirectory>,
) -> PublisherHandle {
    let (transport, inbound, _eventloop) = RumqttTransport::connect(RumqttTransportConfig {
        host: config.host.clone(),
        port: config.port,
        username: config.username.clone(),
        password: config.password.clone(),
        client_id: config.client_id.clone(),
        qos: config.qos,
        retain: config.retain,
    });
    let transport: Arc<dyn MqttTransport> = Arc::new(transport);

    let datasource = PublisherDataSource::new(
        store,
        directory,
        Arc::new(EnabledUserSet::new()),
        config.topic_prefix.as_str(),
    );
    let publisher = Arc::new(MqttPublisher::new(
        datasource,
        transport,
        Duration::from_secs(config.unpublish_delay_seconds),
    ));
    // 代理回送的消息用于清除禁用用户的保留消息
    spawn_inbound_listener(publisher.clone(), inbound);
    let (handle, _task) = spawn_publisher(
        publisher,
        config.full_resync_seconds.map(Duration::from_secs),
    );
    info!(
        target: "hub.server",
        host = %config.host,
        port = config.port,
        topic_prefix = %config.topic_prefix,
        "mqtt_publisher_started"
    );
    handle
}

#[cfg(test)]
pub(crate) fn test_app(directory: Arc<DeviceDirectory>, publisher: Option<PublisherHandle>) -> Router {
    build_app(AppState {
        directory,
        publisher,
    })
}
