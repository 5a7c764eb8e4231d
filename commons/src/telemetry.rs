use std::collections::HashMap;
use std::path::{Path, PathBuf};

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;

const DEFAULT_SERVICE_NAME: &str = "greendish";

pub struct TelemetryConfig {
    pub service_name: String,
    pub traces_endpoint: Option<String>,
    pub logs_endpoint: Option<String>,
    pub auth_header: Option<String>,
    pub local_log_file: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            traces_endpoint: None,
            logs_endpoint: None,
            auth_header: None,
            local_log_file: None,
            default_filter: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env(local_log_file: Option<&Path>) -> Self {
        Self {
            service_name: std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
            traces_endpoint: std::env::var("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT").ok(),
            logs_endpoint: std::env::var("OTEL_EXPORTER_OTLP_LOGS_ENDPOINT").ok(),
            auth_header: std::env::var("OTEL_EXPORTER_AUTH").ok(),
            local_log_file: local_log_file.map(Path::to_path_buf),
            ..Self::default()
        }
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    fn export_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(auth) = &self.auth_header {
            headers.insert("Authorization".to_string(), auth.clone());
        }
        headers
    }
}

pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
    _file_log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shutdown tracer provider: {e}");
        }

        if let Some(provider) = self.logger_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shutdown logger provider: {e}");
        }
    }
}

pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let (writer, file_log_guard) = match &config.local_log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            let (file_writer, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(std::io::stderr.and(file_writer)), Some(guard))
        }
        // stdout belongs to command output
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(writer);

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();

    let tracer_provider = match &config.traces_endpoint {
        Some(endpoint) => {
            let span_exporter = SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .with_headers(config.export_headers())
                .build()?;

            Some(
                SdkTracerProvider::builder()
                    .with_resource(resource.clone())
                    .with_batch_exporter(span_exporter)
                    .build(),
            )
        }
        None => None,
    };

    let logger_provider = match &config.logs_endpoint {
        Some(endpoint) => {
            let log_exporter = LogExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .with_headers(config.export_headers())
                .build()?;

            Some(
                SdkLoggerProvider::builder()
                    .with_resource(resource)
                    .with_batch_exporter(log_exporter)
                    .build(),
            )
        }
        None => None,
    };

    // Spans go to the trace backend, events stay logs.
    let otel_trace_layer = tracer_provider.as_ref().map(|tp| {
        OpenTelemetryLayer::new(tp.tracer(config.service_name.clone())).with_filter(filter_fn(|meta| meta.is_span()))
    });
    let otel_log_layer = logger_provider.as_ref().map(|lp| OpenTelemetryTracingBridge::new(lp));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_trace_layer)
        .with(otel_log_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    // library crates log through the `log` facade
    let _ = tracing_log::LogTracer::builder().init();

    Ok(TelemetryGuard {
        tracer_provider,
        logger_provider,
        _file_log_guard: file_log_guard,
    })
}

pub fn init_telemetry_from_env(local_log_file: Option<&Path>) -> Result<TelemetryGuard, Box<dyn std::error::Error>> {
    init_telemetry(TelemetryConfig::from_env(local_log_file))
}
