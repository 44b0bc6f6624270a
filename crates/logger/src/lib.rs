//! Process-wide `tracing` setup shared by the jsonmon binaries.

mod subscriber;

pub use subscriber::{LOG_FORMAT_ENV, LOG_LEVEL_ENV, init_tracing};
