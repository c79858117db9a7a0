//! Logger bootstrap for binaries and demos.
//!
//! Library code only talks to the `log` facade; installing a backend is the
//! host application's call.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
