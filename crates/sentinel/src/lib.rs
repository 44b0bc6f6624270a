//! sentinel - probe engine for jsonmon
//!
//! Runs a fixed set of independently scheduled probes (web fetches and shell
//! commands), keeps a health state per probe and fires notifications when a
//! probe flips between healthy and failed.
//!
//! # Architecture
//!
//! ```text
//! Registry (owned by the entry point, shared by Arc)
//!   ├── per probe: ProbeSpec + RwLock<HealthState>
//!   └── RwLock<Watermark>  (cache validator of the status document)
//!
//! Scheduler
//!   └── one PollLoop task per probe
//!       ├── Checker::check() up to `tries` times
//!       ├── Registry::record() -> Option<Transition>
//!       └── Notifier::notify() on every transition (detached)
//! ```
//!
//! Notifications fire on edges only. A probe that keeps failing is reported
//! once when it fails and once when it is fixed.

pub mod checker;
pub mod error;
pub mod notify;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod state;

pub use checker::{Checker, HttpChecker, ProbeChecker, ShellChecker};
pub use error::ConfigError;
pub use notify::{Dispatcher, MailMessage, Notifier};
pub use probe::{Probe, ProbeKind, ProbeSpec, Recipient, WebTarget};
pub use registry::{ProbeStatus, Registry, Snapshot, StatusView, Watermark};
pub use scheduler::{PollLoop, Scheduler};
pub use state::{HealthState, Outcome, Transition};

/// Name used in the `Server` header, the mailer header and the user agent.
pub const APP_NAME: &str = "jsonmon";
