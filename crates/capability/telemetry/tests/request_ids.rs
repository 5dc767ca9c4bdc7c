use hub_telemetry::{metrics, new_request_ids, record_cycle_latency_ms, record_message_published};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn counters_are_monotonic() {
    let before = metrics().snapshot();
    record_message_published();
    record_cycle_latency_ms(12);
    let after = metrics().snapshot();
    assert!(after.messages_published > before.messages_published);
    assert!(after.cycle_latency_ms_total >= before.cycle_latency_ms_total + 12);
    assert!(after.cycle_latency_ms_count > before.cycle_latency_ms_count);
}
