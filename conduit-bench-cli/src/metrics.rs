use lazy_static::lazy_static;
use prometheus::{
    register_gauge_vec, register_int_counter_vec, GaugeVec, IntCounterVec,
};

use conduit_bench::BenchmarkReport;

lazy_static! {
    pub static ref ITERATIONS: IntCounterVec = register_int_counter_vec!(
        "bench_iterations_total",
        "Measured iterations by outcome",
        &["framework", "workload", "outcome"]
    )
    .unwrap();
    pub static ref THROUGHPUT: GaugeVec = register_gauge_vec!(
        "bench_throughput",
        "Successful units per wall-clock second",
        &["framework", "workload"]
    )
    .unwrap();
    pub static ref LATENCY_P99_MS: GaugeVec = register_gauge_vec!(
        "bench_latency_p99_ms",
        "99th percentile latency in milliseconds",
        &["framework", "workload"]
    )
    .unwrap();
    pub static ref COLD_START_MS: GaugeVec = register_gauge_vec!(
        "bench_cold_start_ms",
        "Time from spawn to first healthy probe",
        &["framework"]
    )
    .unwrap();
    pub static ref MEMORY_MB: GaugeVec = register_gauge_vec!(
        "bench_memory_mb",
        "Resident memory after the last workload",
        &["framework"]
    )
    .unwrap();
}

/// Load every result of a report into the registry.
pub fn record_report(report: &BenchmarkReport) {
    for result in &report.results {
        let framework = result.framework.as_str();
        let workload = result.workload.as_str();

        ITERATIONS
            .with_label_values(&[framework, workload, "success"])
            .inc_by(result.succeeded);
        ITERATIONS
            .with_label_values(&[framework, workload, "failure"])
            .inc_by(result.failed);
        THROUGHPUT
            .with_label_values(&[framework, workload])
            .set(result.throughput);
        if let Some(p99) = result.p99_ms() {
            LATENCY_P99_MS
                .with_label_values(&[framework, workload])
                .set(p99);
        }
        COLD_START_MS
            .with_label_values(&[framework])
            .set(result.cold_start_ms);
        MEMORY_MB
            .with_label_values(&[framework])
            .set(result.memory_mb);
    }
}

/// Render the registry in the Prometheus text format.
pub fn encode() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("Encoding error"))
}

pub fn write_metrics(path: &str) -> anyhow::Result<()> {
    std::fs::write(path, encode())?;
    Ok(())
}
