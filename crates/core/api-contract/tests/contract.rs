use api_contract::{
    ChannelValueDto, CharValueRequest, MetricsSnapshotDto, RgbwValueDto, RgbwValueRequest,
    WriteResultDto,
};
use serde_json::Value;

fn sample_value() -> ChannelValueDto {
    ChannelValueDto {
        channel_id: 5060,
        device_id: 506,
        number: 0,
        channel_type: "RELAY".to_string(),
        function: "POWERSWITCH".to_string(),
        raw: vec![1, 0, 0, 0, 0, 0, 0, 0],
        double_value: 1.0,
        char_value: 1,
        rgbw: None,
        temperature: None,
        humidity: None,
        online: true,
    }
}

#[test]
fn channel_value_is_camel_case() {
    let value = serde_json::to_value(sample_value()).expect("serialize");
    assert!(value.get("channelId").is_some());
    assert!(value.get("doubleValue").is_some());
    assert!(value.get("charValue").is_some());
    assert_eq!(value.get("type"), Some(&Value::String("RELAY".to_string())));
    assert!(value.get("channel_id").is_none());
}

#[test]
fn absent_decodings_are_omitted() {
    let value = serde_json::to_value(sample_value()).expect("serialize");
    assert!(value.get("rgbw").is_none());
    assert!(value.get("temperature").is_none());
    assert!(value.get("humidity").is_none());

    let mut dto = sample_value();
    dto.temperature = Some(21.5);
    let value = serde_json::to_value(dto).expect("serialize");
    assert!(matches!(value.get("temperature"), Some(Value::Number(_))));
}

#[test]
fn char_value_request_defaults_sender() {
    let req: CharValueRequest = serde_json::from_str(r#"{"value":1}"#).expect("parse");
    assert_eq!(req.value, 1);
    assert_eq!(req.sender_id, 0);

    let req: CharValueRequest =
        serde_json::from_str(r#"{"value":0,"sender_id":7}"#).expect("parse");
    assert_eq!(req.sender_id, 7);
}

#[test]
fn char_value_request_rejects_out_of_range() {
    assert!(serde_json::from_str::<CharValueRequest>(r#"{"value":256}"#).is_err());
}

#[test]
fn rgbw_request_accepts_both_casings() {
    let camel: RgbwValueRequest =
        serde_json::from_str(r#"{"color":16711680,"colorBrightness":50,"brightness":20}"#)
            .expect("parse");
    let snake: RgbwValueRequest =
        serde_json::from_str(r#"{"color":16711680,"color_brightness":50,"brightness":20}"#)
            .expect("parse");
    let expected = RgbwValueDto {
        color: 0xFF0000,
        color_brightness: 50,
        brightness: 20,
    };
    assert_eq!(camel.value, expected);
    assert_eq!(snake.value, expected);
}

#[test]
fn write_result_and_metrics_serialize() {
    let value = serde_json::to_value(WriteResultDto { accepted: false }).expect("serialize");
    assert_eq!(value.get("accepted"), Some(&Value::Bool(false)));

    let metrics = MetricsSnapshotDto {
        cycles_opened: 1,
        cycles_rejected: 0,
        cycle_latency_ms_total: 5,
        cycle_latency_ms_count: 1,
        messages_published: 15,
        publish_failures: 0,
        unsubscribes_scheduled: 0,
        unsubscribes_cancelled: 0,
        unsubscribes_executed: 0,
        registry_reload_failures: 0,
        channel_values_dispatched: 2,
    };
    let value = serde_json::to_value(metrics).expect("serialize");
    assert!(value.get("messagesPublished").is_some());
    assert!(value.get("channelValuesDispatched").is_some());
}
