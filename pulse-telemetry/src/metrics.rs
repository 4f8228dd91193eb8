use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Installs the global Prometheus recorder and serves `[::]:{port}/metrics`.
///
/// Must be called at most once per process, from within a Tokio runtime so the HTTP
/// listener is spawned on it.
pub fn init_metrics(app_name: &str, port: u16) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port))
        .add_global_label("app", app_name)
        .install()
}
