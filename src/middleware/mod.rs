//! HTTP Middleware
//! Mission: Cross-cutting request plumbing

pub mod logging;

pub use logging::request_logging;
