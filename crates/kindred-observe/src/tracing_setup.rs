//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! ```no_run
//! use kindred_observe::tracing_setup::{init_tracing, TracingOptions};
//!
//! init_tracing(&TracingOptions::new("info,kindred=debug")).unwrap();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so buffered spans can be flushed on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Filter directives used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl TracingOptions {
    pub fn new(default_filter: impl Into<String>) -> Self {
        Self {
            default_filter: default_filter.into(),
            json: false,
            otel: false,
        }
    }

    /// Filter directives for a CLI verbosity count.
    pub fn filter_for_verbosity(verbose: u8, quiet: bool) -> &'static str {
        match (verbose, quiet) {
            (0, true) => "error",
            (0, false) => "warn",
            (1, _) => "info,kindred=debug",
            _ => "trace",
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global tracing subscriber.
///
/// Log output goes to stderr so that `--json` command output on stdout stays
/// machine readable. `RUST_LOG` overrides `default_filter` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = options.env_filter();

    let plain = (!options.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });
    let json = options.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
    });

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("kindred");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(json)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending spans. No-op when OpenTelemetry was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filters() {
        assert_eq!(TracingOptions::filter_for_verbosity(0, true), "error");
        assert_eq!(TracingOptions::filter_for_verbosity(0, false), "warn");
        assert_eq!(TracingOptions::filter_for_verbosity(1, false), "info,kindred=debug");
        assert_eq!(TracingOptions::filter_for_verbosity(3, true), "trace");
    }

    #[test]
    fn options_default_to_plain_output() {
        let options = TracingOptions::new("warn");
        assert!(!options.json);
        assert!(!options.otel);
        assert_eq!(options.default_filter, "warn");
    }
}
