use metrics::{counter, describe_counter};

/// Initialize counter descriptions
pub fn init() {
    describe_counter!(
        "dexstats_heights_scanned_total",
        "Total number of block heights whose end-block events were scanned"
    );
    describe_counter!(
        "dexstats_swap_events_total",
        "Total number of swap events decoded"
    );
    describe_counter!(
        "dexstats_swap_events_failed_total",
        "Total number of decoded swap events that did not execute"
    );
    describe_counter!(
        "dexstats_rpc_requests_total",
        "Total number of requests sent to the chain node"
    );
    describe_counter!("dexstats_errors_total", "Total number of errors");
}

pub fn heights_scanned(count: u64) {
    counter!("dexstats_heights_scanned_total").increment(count);
}

pub fn swap_events(count: u64) {
    counter!("dexstats_swap_events_total").increment(count);
}

pub fn swap_events_failed(count: u64) {
    counter!("dexstats_swap_events_failed_total").increment(count);
}

/// Increment request counter, labelled by endpoint
pub fn rpc_requests(endpoint: &str) {
    counter!("dexstats_rpc_requests_total", "endpoint" => endpoint.to_string()).increment(1);
}

/// Increment errors counter
pub fn errors(count: u64, error_type: &str) {
    counter!("dexstats_errors_total", "type" => error_type.to_string()).increment(count);
}
