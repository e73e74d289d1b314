//! Wire-shape vectors for the sync protocol.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gaugeboard_core::protocol::{ClientMessage, MetricView, SyncEvent, Topic};
use serde_json::{json, Value};

#[test]
fn delta_serializes_with_stable_tag_and_fields() {
    let view = MetricView {
        metric_id: 7,
        display_name: "cpu usage".into(),
        canonical_name: "cpu_usage".into(),
        value: 42.5,
    };
    let wire: Value = serde_json::to_value(SyncEvent::delta(&view)).unwrap();
    assert_eq!(
        wire,
        json!({
            "type": "metric_sync",
            "metric_id": 7,
            "display_name": "cpu usage",
            "canonical_name": "cpu_usage",
            "value": 42.5,
        })
    );
}

#[test]
fn registry_changed_is_a_bare_tag() {
    let wire: Value = serde_json::to_value(SyncEvent::RegistryChanged).unwrap();
    assert_eq!(wire, json!({ "type": "registry_changed" }));
}

#[test]
fn notification_carries_only_text() {
    let wire: Value = serde_json::to_value(SyncEvent::Notification {
        text: "deploy finished".into(),
    })
    .unwrap();
    assert_eq!(wire, json!({ "type": "notification", "text": "deploy finished" }));
}

#[test]
fn events_route_to_their_topics() {
    let view = MetricView {
        metric_id: 1,
        display_name: "m".into(),
        canonical_name: "m".into(),
        value: 0.0,
    };
    assert_eq!(SyncEvent::delta(&view).topic(), Topic::MetricSync);
    assert_eq!(SyncEvent::RegistryChanged.topic(), Topic::MetricSync);
    assert_eq!(
        SyncEvent::Notification { text: "x".into() }.topic(),
        Topic::NotificationFeed
    );
    assert_eq!(Topic::MetricSync.as_str(), "metric-sync");
    assert_eq!(Topic::NotificationFeed.as_str(), "notification-feed");
}

#[test]
fn parse_metric_update_full() {
    let msg: ClientMessage = serde_json::from_str(
        r#"{"type":"metric_update","metric_id":3,"metric_name":"renamed","metric_value":1.25}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ClientMessage::MetricUpdate {
            metric_id: 3,
            metric_name: Some("renamed".into()),
            metric_value: Some(1.25),
        }
    );
}

#[test]
fn parse_metric_update_value_only() {
    let msg: ClientMessage =
        serde_json::from_str(r#"{"type":"metric_update","metric_id":1,"metric_value":0}"#).unwrap();
    assert_eq!(
        msg,
        ClientMessage::MetricUpdate {
            metric_id: 1,
            metric_name: None,
            metric_value: Some(0.0),
        }
    );
}

#[test]
fn unknown_type_tags_are_rejected() {
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"drop_tables"}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>(r#"{"metric_id":1}"#).is_err());
    assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
}

#[test]
fn sync_events_round_trip() {
    for event in [
        SyncEvent::RegistryChanged,
        SyncEvent::Notification { text: "hi".into() },
        SyncEvent::MetricSync {
            metric_id: 9,
            display_name: "d".into(),
            canonical_name: "d".into(),
            value: -3.5,
        },
    ] {
        let s = serde_json::to_string(&event).unwrap();
        let back: SyncEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, event);
    }
}
