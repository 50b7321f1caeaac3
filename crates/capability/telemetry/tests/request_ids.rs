use spraygw_telemetry::{new_request_ids, record_alarms_emitted, record_frame_received};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
}

#[test]
fn counters_accumulate() {
    let before = spraygw_telemetry::metrics().snapshot();
    record_frame_received();
    record_alarms_emitted(3);
    let after = spraygw_telemetry::metrics().snapshot();
    assert_eq!(after.frames_received, before.frames_received + 1);
    assert_eq!(after.alarms_emitted, before.alarms_emitted + 3);
}
