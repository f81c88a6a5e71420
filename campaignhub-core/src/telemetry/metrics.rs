//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    // Prometheus defaults plus sub-millisecond buckets.
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!(
        "campaignhub_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "campaignhub_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "campaignhub_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Auth metrics
    describe_counter!(
        "campaignhub_auth_registrations_total",
        "Total number of completed registrations"
    );
    describe_counter!(
        "campaignhub_auth_login_total",
        "Total number of login attempts"
    );

    // Business metrics
    describe_counter!(
        "campaignhub_campaign_mutations_total",
        "Campaign writes by operation"
    );

    counter!("campaignhub_auth_registrations_total").absolute(0);
    counter!("campaignhub_auth_login_total", "result" => "success").absolute(0);
    counter!("campaignhub_auth_login_total", "result" => "failure").absolute(0);
    for operation in ["create", "update", "update_status", "delete"] {
        counter!("campaignhub_campaign_mutations_total", "operation" => operation).absolute(0);
    }
    gauge!("campaignhub_http_requests_in_flight").set(0.0);
}
