use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // Business metrics
    pub static ref BASELINE_CHANGES: IntCounter = register_int_counter!(
        "baseline_changes_total",
        "Total baseline route changes"
    ).expect("metric can be created");

    pub static ref SURPLUS_BANKED: IntCounter = register_int_counter!(
        "surplus_banked_total",
        "Total successful surplus banking operations"
    ).expect("metric can be created");

    pub static ref BANKED_APPLIED: IntCounter = register_int_counter!(
        "banked_applied_total",
        "Total successful applications of banked surplus"
    ).expect("metric can be created");

    pub static ref POOLS_CREATED: IntCounter = register_int_counter!(
        "pools_created_total",
        "Total compliance pools created"
    ).expect("metric can be created");

    // Error metrics
    pub static ref COMPLIANCE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "compliance_errors_total",
        "Total failed requests by error type",
        &["type"]
    ).expect("metric can be created");
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
