use std::net::SocketAddr;

use tracing::{info, warn};

use crate::constants::ENV_METRICS_PORT;

/// Installs the Prometheus exporter when `CATALOG_METRICS_PORT` is set.
/// Without it the `metrics` macros record nothing.
pub fn init_metrics() {
    let Some(port) = std::env::var(ENV_METRICS_PORT)
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
    else {
        return;
    };

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}
