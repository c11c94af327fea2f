//! Prometheus text export of every metric in the default registry.

use crate::TelemetryError;
use prometheus::{Encoder, TextEncoder};

/// Encode all registered metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsExport(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsExport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{register_int_counter, IntCounter};

    #[test]
    fn test_registered_counter_is_exported() {
        let counter: IntCounter =
            register_int_counter!("core_telemetry_test_total", "Counter used by the export test")
                .unwrap();
        counter.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("core_telemetry_test_total 1"));
    }
}
