use metrics::{describe_histogram, histogram};
use std::time::Duration;

/// Initialize histogram descriptions
pub fn init() {
    describe_histogram!(
        "dexstats_rpc_request_duration_seconds",
        "Time for requests to the chain node"
    );
}

/// Record request duration
pub fn rpc_request_duration(duration: Duration, endpoint: &str) {
    histogram!("dexstats_rpc_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}
