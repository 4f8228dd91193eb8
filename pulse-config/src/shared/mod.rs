//! Shared configuration types for the pulse demo.

mod base;
mod connection;
mod dashboard;
mod demo;
mod metrics;
mod pipeline;
mod store;

pub use base::ValidationError;
pub use connection::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
pub use dashboard::DashboardConfig;
pub use demo::DemoConfig;
pub use metrics::MetricsConfig;
pub use pipeline::PipelineConfig;
pub use store::StoreConfig;
