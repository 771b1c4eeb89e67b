use axum::response::Response;
use serde_json::Value;

use crate::scoring::{AggregationKind, EditPolicy, Signal};

pub(super) fn leaf(id: &str, value: f64, weight: f64) -> Signal {
    Signal::leaf(id, id.to_uppercase(), value, weight)
}

pub(super) fn formula(id: &str, kind: AggregationKind, signals: Vec<Signal>) -> Signal {
    Signal::formula(id, id.to_uppercase(), 1.0, kind, signals)
}

pub(super) fn pair(values: [f64; 2]) -> Vec<Signal> {
    vec![leaf("a", values[0], 1.0), leaf("b", values[1], 1.0)]
}

pub(super) fn open_policy() -> EditPolicy {
    EditPolicy {
        max_weight: 100.0,
        unit_values: false,
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
