// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Logging, span export and metrics backends for the binary.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::net::SocketAddr;
use tracing::{info, warn};

use addsvc_core::infrastructure::middleware::instrument::describe_metrics;

/// Initialize tracing subscriber for logging
pub fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

/// Export spans to an OTLP/gRPC collector.
pub fn init_otlp(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to build OTLP span exporter")?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(Resource::builder().with_service_name("addsvc").build())
        .build();
    global::set_tracer_provider(provider.clone());

    info!(endpoint, "OTLP span export enabled");
    Ok(provider)
}

pub fn shutdown_otlp(provider: SdkTracerProvider) {
    if let Err(e) = provider.shutdown() {
        warn!(error = %e, "Failed to shut down tracer provider");
    }
}

/// Serve Prometheus metrics on `addr`.
pub fn init_prometheus(addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid metrics address: {addr}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    describe_metrics();

    info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
