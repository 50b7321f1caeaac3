use api_contract::{AlarmItemDto, ConfigFrameRequest, TypedFrameRequest};
use serde_json::Value;

#[test]
fn typed_frame_request_accepts_camel_case() {
    let payload = r#"{
        "unitId": 1,
        "functionCode": 16,
        "startAddress": 0,
        "segments": [
            { "typeId": 7, "values": [true, 0, "1"] },
            { "typeId": 8, "values": [1, 2] }
        ]
    }"#;
    let req: TypedFrameRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.unit_id, 1);
    assert_eq!(req.function_code, 0x10);
    assert_eq!(req.start_address, 0);
    assert_eq!(req.segments.len(), 2);
    assert_eq!(req.segments[0].type_id, 0x07);
    assert_eq!(req.segments[1].values.len(), 2);
}

#[test]
fn config_frame_request_accepts_mixed_value_types() {
    let payload = r#"{
        "unitId": 2,
        "functionCode": 16,
        "items": [
            { "dataId": 1, "value": "A" },
            { "dataId": 6, "value": -3 },
            { "dataId": 7, "value": 12.5 }
        ]
    }"#;
    let req: ConfigFrameRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.items.len(), 3);
    assert_eq!(req.items[0].data_id, 0x01);
    assert_eq!(req.items[2].data_id, 0x07);
}

#[test]
fn alarm_item_is_camel_case() {
    let item = AlarmItemDto {
        device: "停止器1".to_string(),
        index: 0,
        unit_id: 1,
        timestamp: 1_700_000_000_000,
    };
    let value = serde_json::to_value(item).expect("serialize");
    assert!(value.get("unitId").is_some());
    assert!(value.get("unit_id").is_none());
    assert!(matches!(value.get("timestamp"), Some(Value::Number(_))));
}
