//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request metrics.
//!
//! Authentication lives in [`crate::auth`]; tracing is `tower_http`'s
//! `TraceLayer`, installed in [`crate::app`].

pub mod metrics;
