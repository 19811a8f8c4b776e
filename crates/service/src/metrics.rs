//! Prometheus counters for business events.
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

pub static STATUS_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "grc_status_transitions_total",
        "Persisted status changes by entity and target status",
        &["entity", "to"]
    )
    .expect("register grc_status_transitions_total")
});

pub static DIAGNOSTIC_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "grc_diagnostic_events_total",
        "Client diagnostics events recorded by kind",
        &["kind"]
    )
    .expect("register grc_diagnostic_events_total")
});

pub fn record_transition(entity: &str, to: &str) {
    STATUS_TRANSITIONS.with_label_values(&[entity, to]).inc();
}

pub fn record_diagnostic(kind: &str) {
    DIAGNOSTIC_EVENTS.with_label_values(&[kind]).inc();
}
