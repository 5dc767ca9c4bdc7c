use domain::ChannelFunction;
use hub_storage::{
    ChannelRow, ChannelSource, DeviceRow, InMemoryMqttDataStore, MqttDataStore, UserRow,
};

fn user(user_id: i32, suid: &str) -> UserRow {
    UserRow {
        user_id,
        user_suid: suid.to_string(),
        user_email: format!("{suid}@example.com"),
        user_timezone: "Europe/Warsaw".to_string(),
    }
}

fn device(user_id: i32, device_id: i32) -> DeviceRow {
    DeviceRow {
        user_id,
        user_suid: String::new(),
        device_id,
        device_enabled: true,
        device_last_connected_at_ms: None,
        device_last_ipv4: None,
        device_mfr_id: 0,
        device_name: format!("device-{device_id}"),
        device_proto_version: 10,
        device_soft_ver: "2.7".to_string(),
    }
}

fn channel(user_id: i32, device_id: i32, channel_id: i32, number: i32) -> ChannelRow {
    ChannelRow {
        user_id,
        user_suid: String::new(),
        device_id,
        channel_id,
        channel_number: number,
        channel_type: 2900,
        channel_func: 130,
        channel_param1: 0,
        channel_param2: 0,
        channel_param3: 0,
        channel_caption: None,
        channel_hidden: false,
    }
}

fn seeded() -> InMemoryMqttDataStore {
    let store = InMemoryMqttDataStore::new();
    store.upsert_user(user(1, "alpha"), true).expect("user");
    store.upsert_user(user(2, "beta"), false).expect("user");
    store.upsert_device(device(1, 10)).expect("device");
    store.upsert_device(device(2, 20)).expect("device");
    store.upsert_channel(channel(1, 10, 100, 0)).expect("channel");
    store.upsert_channel(channel(1, 10, 101, 1)).expect("channel");
    store.upsert_channel(channel(2, 20, 200, 0)).expect("channel");
    store
}

#[tokio::test]
async fn queries_only_return_mqtt_enabled_users() {
    let store = seeded();
    let mut users = store.open_user_query(None).await.expect("users");
    assert_eq!(users.fetch_row().map(|row| row.user_id), Some(1));
    assert!(users.fetch_row().is_none());

    let mut devices = store.open_device_query(None, None).await.expect("devices");
    let first = devices.fetch_row().expect("device row");
    assert_eq!(first.device_id, 10);
    assert_eq!(first.user_suid, "alpha");
    assert!(devices.fetch_row().is_none());

    let channels = store
        .open_channel_query(Some(2), None, None)
        .await
        .expect("channels");
    assert_eq!(channels.remaining(), 0);
}

#[tokio::test]
async fn channel_query_honours_every_filter() {
    let store = seeded();
    let mut query = store
        .open_channel_query(Some(1), Some(10), Some(101))
        .await
        .expect("channels");
    let row = query.fetch_row().expect("row");
    assert_eq!(row.channel_id, 101);
    assert_eq!(row.user_suid, "alpha");
    assert!(query.fetch_row().is_none());
}

#[tokio::test]
async fn deleting_device_drops_its_channels() {
    let store = seeded();
    assert!(store.delete_device(10).expect("delete"));
    let channels = store.load_device_channels(10).await.expect("channels");
    assert!(channels.is_empty());
    let query = store
        .open_channel_query(Some(1), None, None)
        .await
        .expect("channels");
    assert_eq!(query.remaining(), 0);
}

#[tokio::test]
async fn function_change_is_visible_to_loaders() {
    let store = seeded();
    assert!(
        store
            .set_channel_function(100, ChannelFunction::None)
            .expect("update")
    );
    let channels = store.load_device_channels(10).await.expect("channels");
    let changed = channels
        .iter()
        .find(|record| record.channel_id == 100)
        .expect("channel 100");
    assert_eq!(changed.channel_func, 0);
}

#[tokio::test]
async fn unavailable_store_fails_every_query() {
    let store = seeded();
    store.set_available(false);
    assert!(store.open_user_query(None).await.is_err());
    assert!(store.load_devices().await.is_err());

    store.set_available(true);
    let devices = store.load_devices().await.expect("devices");
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1].user_suid, "beta");
}
