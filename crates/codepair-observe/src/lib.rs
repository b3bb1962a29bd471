//! Observability setup for codepair: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
