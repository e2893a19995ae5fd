use crate::config::TracingConfig;

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider as _;
#[cfg(feature = "telemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::trace::TracerProvider;

#[cfg(feature = "telemetry")]
pub type TelemetryProvider = TracerProvider;

#[cfg(not(feature = "telemetry"))]
pub type TelemetryProvider = ();

/// Installs the OTLP exporter when tracing is enabled. An exporter that
/// cannot be installed is reported on stderr and tracing stays off, since
/// the subscriber is not up yet.
#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TracingConfig) -> Option<TracerProvider> {
    if !config.enabled {
        return None;
    }

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint);

    let installed = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
                    config.sample_rate,
                ))
                .with_resource(opentelemetry_sdk::Resource::new(vec![
                    opentelemetry::KeyValue::new("service.name", config.service_name.clone()),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio);

    match installed {
        Ok(provider) => Some(provider),
        Err(e) => {
            eprintln!("failed to install OpenTelemetry tracer: {e}");
            None
        }
    }
}

#[cfg(feature = "telemetry")]
pub fn make_otel_layer(
    provider: &TracerProvider,
) -> tracing_opentelemetry::OpenTelemetryLayer<
    tracing_subscriber::Registry,
    opentelemetry_sdk::trace::Tracer,
> {
    let tracer = provider.tracer("sieve");
    tracing_opentelemetry::layer().with_tracer(tracer)
}

#[cfg(feature = "telemetry")]
pub fn shutdown_telemetry(provider: TracerProvider) {
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "failed to shut down tracer provider");
    }
}

#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TracingConfig) -> Option<TelemetryProvider> {
    None
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown_telemetry(_provider: TelemetryProvider) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_telemetry_returns_none_when_disabled() {
        let config = TracingConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_telemetry(&config).is_none());
    }

    #[cfg(not(feature = "telemetry"))]
    #[test]
    fn enabled_tracing_without_feature_is_a_no_op() {
        let config = TracingConfig {
            enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "sieve-test".to_string(),
            sample_rate: 0.5,
        };
        assert!(init_telemetry(&config).is_none());
    }
}
