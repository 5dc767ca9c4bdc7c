//! 计数器快照
//!
//! - GET /metrics

use crate::utils::response::ok;
use api_contract::MetricsSnapshotDto;
use axum::response::Response;
use hub_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    ok(MetricsSnapshotDto {
        cycles_opened: snapshot.cycles_opened,
        cycles_rejected: snapshot.cycles_rejected,
        cycle_latency_ms_total: snapshot.cycle_latency_ms_total,
        cycle_latency_ms_count: snapshot.cycle_latency_ms_count,
        messages_published: snapshot.messages_published,
        publish_failures: snapshot.publish_failures,
        unsubscribes_scheduled: snapshot.unsubscribes_scheduled,
        unsubscribes_cancelled: snapshot.unsubscribes_cancelled,
        unsubscribes_executed: snapshot.unsubscribes_executed,
        registry_reload_failures: snapshot.registry_reload_failures,
        channel_values_dispatched: snapshot.channel_values_dispatched,
    })
}
