use domain::{ChannelFunction, ChannelType};
use hub_channels::{DeviceDirectory, NoopDeviceRpc};
use hub_mqtt::{EnabledUserSet, MqttDsContext, MqttMessage, PublisherDataSource, UserRef};
use hub_storage::{ChannelRow, DeviceRow, InMemoryMqttDataStore, UserRow};
use std::collections::HashSet;
use std::sync::Arc;

struct Fixture {
    store: Arc<InMemoryMqttDataStore>,
    directory: Arc<DeviceDirectory>,
    enabled: Arc<EnabledUserSet>,
    datasource: PublisherDataSource,
}

fn user(user_id: i32, suid: &str) -> UserRow {
    UserRow {
        user_id,
        user_suid: suid.to_string(),
        user_email: format!("{}@example.org", suid),
        user_timezone: "UTC".to_string(),
    }
}

fn device(user_id: i32, device_id: i32) -> DeviceRow {
    DeviceRow {
        user_id,
        user_suid: String::new(),
        device_id,
        device_enabled: true,
        device_last_connected_at_ms: Some(1_600_000_000_000),
        device_last_ipv4: Some("192.168.1.2".to_string()),
        device_mfr_id: 0,
        device_name: format!("device-{}", device_id),
        device_proto_version: 12,
        device_soft_ver: "2.8.0".to_string(),
    }
}

fn channel(user_id: i32, device_id: i32, channel_id: i32, function: ChannelFunction) -> ChannelRow {
    ChannelRow {
        user_id,
        user_suid: String::new(),
        device_id,
        channel_id,
        channel_number: channel_id % 10,
        channel_type: ChannelType::Relay.code(),
        channel_func: function.code(),
        channel_param1: 0,
        channel_param2: 0,
        channel_param3: 0,
        channel_caption: None,
        channel_hidden: false,
    }
}

/// 用户 1、2、4 启用，用户 3 未启用。
fn fixture() -> Fixture {
    let store = Arc::new(InMemoryMqttDataStore::new());
    store.upsert_user(user(1, "alpha"), true).expect("user");
    store.upsert_user(user(2, "beta"), true).expect("user");
    store.upsert_user(user(3, "gamma"), false).expect("user");
    store.upsert_user(user(4, "delta"), true).expect("user");
    store.upsert_device(device(1, 10)).expect("device");
    store.upsert_device(device(2, 20)).expect("device");
    store.upsert_device(device(3, 30)).expect("device");
    store
        .upsert_channel(channel(1, 10, 100, ChannelFunction::PowerSwitch))
        .expect("channel");
    store
        .upsert_channel(channel(1, 10, 101, ChannelFunction::LightSwitch))
        .expect("channel");
    store
        .upsert_channel(channel(2, 20, 200, ChannelFunction::Thermometer))
        .expect("channel");
    store
        .upsert_channel(channel(3, 30, 300, ChannelFunction::PowerSwitch))
        .expect("channel");

    let directory = Arc::new(DeviceDirectory::new(Arc::new(NoopDeviceRpc)));
    let enabled = Arc::new(EnabledUserSet::new());
    let datasource = PublisherDataSource::new(
        store.clone(),
        directory.clone(),
        enabled.clone(),
        "supla",
    );
    Fixture {
        store,
        directory,
        enabled,
        datasource,
    }
}

async fn drain(datasource: &PublisherDataSource, ctx: MqttDsContext) -> Option<Vec<MqttMessage>> {
    let mut cycle = datasource.open(ctx)?;
    let mut messages = Vec::new();
    while let Some(message) = cycle.next_message().await {
        messages.push(message);
    }
    cycle.close();
    Some(messages)
}

fn topics(messages: &[MqttMessage]) -> Vec<&str> {
    messages.iter().map(|message| message.topic.as_str()).collect()
}

#[tokio::test]
async fn full_cycle_emits_union_without_duplicates() {
    let fixture = fixture();
    let messages = drain(&fixture.datasource, MqttDsContext::Full)
        .await
        .expect("full cycle");

    // 用户 3×2，设备 2×7，通道 3×(4 + 1 发现 + 1 connected)
    assert_eq!(messages.len(), 3 * 2 + 2 * 7 + 3 * 6);
    let unique: HashSet<_> = topics(&messages).into_iter().collect();
    assert_eq!(unique.len(), messages.len());
    assert!(messages.iter().all(|message| !message.topic.contains("gamma")));
    assert_eq!(messages[0].topic, "supla/alpha/account/email");
    assert!(unique.contains("supla/beta/devices/20/channels/200/state/connected"));
    assert!(unique.contains("homeassistant/sensor/beta/200/config"));

    assert_eq!(fixture.enabled.user_ids(), vec![1, 2, 4]);
}

#[tokio::test]
async fn full_cycle_reports_transitions() {
    let fixture = fixture();
    let mut cycle = fixture.datasource.open(MqttDsContext::Full).expect("open");
    while cycle.next_message().await.is_some() {}
    let first = cycle.close();
    assert_eq!(first.enabled.len(), 3);
    assert!(first.disabled.is_empty());

    fixture.store.set_mqtt_enabled(2, false).expect("toggle");
    let mut cycle = fixture.datasource.open(MqttDsContext::Full).expect("open");
    while cycle.next_message().await.is_some() {}
    let second = cycle.close();
    assert!(second.enabled.is_empty());
    assert_eq!(
        second.disabled,
        vec![UserRef {
            user_id: 2,
            suid: "beta".to_string()
        }]
    );
}

#[tokio::test]
async fn user_cycle_adds_then_removes_user() {
    let fixture = fixture();
    let messages = drain(&fixture.datasource, MqttDsContext::User { user_id: 1 })
        .await
        .expect("user cycle");
    // 账户主题在前，随后是设备与通道
    assert_eq!(messages[0].topic, "supla/alpha/account/email");
    assert_eq!(messages[1].topic, "supla/alpha/account/timezone");
    assert_eq!(messages.len(), 2 + 7 + 2 * 6);
    assert!(messages.iter().all(|message| message.topic.contains("alpha")));
    assert!(fixture.enabled.contains(1));
    assert!(!fixture.enabled.contains(2));

    fixture.store.set_mqtt_enabled(1, false).expect("toggle");
    let mut cycle = fixture
        .datasource
        .open(MqttDsContext::User { user_id: 1 })
        .expect("open");
    assert!(cycle.next_message().await.is_none());
    let transitions = cycle.close();
    assert_eq!(transitions.disabled.len(), 1);
    assert!(!fixture.enabled.contains(1));
}

#[tokio::test]
async fn device_and_state_scopes_require_enabled_user() {
    let fixture = fixture();
    let device_ctx = MqttDsContext::Device {
        user_id: 1,
        device_id: 10,
    };
    let state_ctx = MqttDsContext::ChannelState {
        user_id: 1,
        device_id: 10,
        channel_id: 100,
    };
    assert!(fixture.datasource.open(device_ctx).is_none());
    assert!(fixture.datasource.open(state_ctx).is_none());

    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");
    assert!(fixture.datasource.open(device_ctx).is_some());
    assert!(fixture.datasource.open(state_ctx).is_some());
}

#[tokio::test]
async fn device_cycle_never_changes_enabled_set() {
    let fixture = fixture();
    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");
    fixture.store.set_mqtt_enabled(1, false).expect("toggle");

    let messages = drain(
        &fixture.datasource,
        MqttDsContext::Device {
            user_id: 1,
            device_id: 10,
        },
    )
    .await
    .expect("device cycle");
    assert!(messages.is_empty());
    assert!(fixture.enabled.contains(1));
}

#[tokio::test]
async fn function_none_drops_state_topics_of_that_channel_only() {
    let fixture = fixture();
    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");
    fixture
        .store
        .set_channel_function(100, ChannelFunction::None)
        .expect("function");

    let messages = drain(
        &fixture.datasource,
        MqttDsContext::Device {
            user_id: 1,
            device_id: 10,
        },
    )
    .await
    .expect("device cycle");
    let topics = topics(&messages);
    assert!(topics.contains(&"supla/alpha/devices/10/channels/100/function"));
    assert!(!topics.iter().any(|topic| topic.contains("channels/100/state")));
    assert!(!topics.contains(&"homeassistant/switch/alpha/100/config"));
    assert!(topics.contains(&"supla/alpha/devices/10/channels/101/state/connected"));
    assert!(topics.contains(&"homeassistant/light/alpha/101/config"));
}

#[tokio::test]
async fn unreachable_store_counts_as_end_of_data() {
    let fixture = fixture();
    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");
    fixture.store.set_available(false);

    let messages = drain(&fixture.datasource, MqttDsContext::User { user_id: 1 })
        .await
        .expect("user cycle");
    assert!(messages.is_empty());
    // 打开失败与无数据不可区分：用户被移出集合
    assert!(!fixture.enabled.contains(1));
    assert!(fixture.enabled.contains(2));
}

#[tokio::test]
async fn aborted_cycle_does_not_merge() {
    let fixture = fixture();
    let mut cycle = fixture.datasource.open(MqttDsContext::Full).expect("open");
    assert!(cycle.next_message().await.is_some());
    let transitions = cycle.close();
    assert!(transitions.is_empty());
    assert!(fixture.enabled.is_empty());

    let mut dropped = fixture.datasource.open(MqttDsContext::Full).expect("open");
    assert!(dropped.next_message().await.is_some());
    drop(dropped);
    assert!(fixture.enabled.is_empty());
}

#[tokio::test]
async fn deleted_device_is_not_published() {
    let fixture = fixture();
    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");
    fixture.store.delete_device(10).expect("delete");

    let messages = drain(
        &fixture.datasource,
        MqttDsContext::Device {
            user_id: 1,
            device_id: 10,
        },
    )
    .await
    .expect("device cycle");
    assert!(messages.is_empty());
}

#[tokio::test]
async fn channel_state_cycle_reads_registry() {
    let fixture = fixture();
    drain(&fixture.datasource, MqttDsContext::Full).await.expect("full");

    fixture.directory.register_user(1, "alpha");
    let registry = fixture.directory.attach_device(1, 10).expect("registry");
    registry.add_channel(100, 0, ChannelType::Relay, ChannelFunction::PowerSwitch, 0, 0, 0);
    registry.set_value(100, &[1, 0, 0, 0, 0, 0, 0, 0]);
    fixture.directory.set_device_online(1, 10, true);

    let messages = drain(
        &fixture.datasource,
        MqttDsContext::ChannelState {
            user_id: 1,
            device_id: 10,
            channel_id: 100,
        },
    )
    .await
    .expect("state cycle");
    assert_eq!(
        messages,
        vec![
            MqttMessage::new("supla/alpha/devices/10/channels/100/state/connected", "true"),
            MqttMessage::new("supla/alpha/devices/10/channels/100/state/on", "true"),
        ]
    );
    assert_eq!(fixture.enabled.user_ids(), vec![1, 2, 4]);
}
