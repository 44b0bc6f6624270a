//! Shared probe registry.
//!
//! Owned by the entry point and handed out as `Arc<Registry>` to the
//! scheduler (writers) and the HTTP layer (readers).
//!
//! Locking: one `RwLock` per probe state plus one for the watermark. Locks
//! are always taken watermark first, then state, and never held across I/O.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::probe::ProbeSpec;
use crate::state::{HealthState, Outcome, Transition};

/// Opaque cache validator, rendered as a weak ETag `W/"<unix nanos>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    pub fn at(ts: DateTime<Utc>) -> Self {
        Self(unix_nanos(ts))
    }

    /// Move forward to `ts`, or by one tick if `ts` is not newer.
    fn bump(&mut self, ts: DateTime<Utc>) {
        self.0 = unix_nanos(ts).max(self.0.saturating_add(1));
    }

    pub fn etag(&self) -> String {
        self.to_string()
    }

    /// Compare with an `If-None-Match` value.
    pub fn matches(&self, validator: &str) -> bool {
        validator.split(',').any(|candidate| {
            let candidate = candidate.trim();
            candidate == "*" || candidate == self.etag()
        })
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.0)
    }
}

fn unix_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or_else(|| ts.timestamp_micros().saturating_mul(1_000))
}

/// Public view of one probe in the status document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl ProbeStatus {
    fn new(spec: &ProbeSpec, state: &HealthState) -> Self {
        let present = |value: &Option<String>| value.clone().filter(|value| !value.is_empty());
        Self {
            name: present(&spec.name),
            web: present(&spec.web),
            shell: present(&spec.shell),
            failed: state.failed(),
            since: state.since_rfc3339(),
        }
    }
}

/// Every probe's public state together with the validator it belongs to.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub etag: Watermark,
    pub probes: Vec<ProbeStatus>,
}

/// Result of a conditional read.
#[derive(Debug, Clone)]
pub enum StatusView {
    /// The client's validator is still current.
    Unchanged(Watermark),
    Changed(Snapshot),
}

struct Entry {
    spec: Arc<ProbeSpec>,
    state: RwLock<HealthState>,
}

pub struct Registry {
    entries: Vec<Entry>,
    watermark: RwLock<Watermark>,
    started: Watermark,
}

impl Registry {
    /// Build the registry in config order. That order is kept for the
    /// lifetime of the process.
    pub fn new(specs: impl IntoIterator<Item = ProbeSpec>) -> Self {
        let started = Watermark::at(Utc::now());
        let entries = specs
            .into_iter()
            .map(|spec| Entry { spec: Arc::new(spec), state: RwLock::new(HealthState::default()) })
            .collect();

        Self { entries, watermark: RwLock::new(started), started }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spec(&self, index: usize) -> Option<Arc<ProbeSpec>> {
        self.entries.get(index).map(|entry| entry.spec.clone())
    }

    /// Validator fixed at construction time.
    pub fn started(&self) -> Watermark {
        self.started
    }

    /// Current validator of the status document.
    pub async fn etag(&self) -> Watermark {
        *self.watermark.read().await
    }

    /// Copy of one probe's state triple.
    pub async fn state(&self, index: usize) -> Option<HealthState> {
        let entry = self.entries.get(index)?;
        Some(entry.state.read().await.clone())
    }

    /// Apply the outcome of a poll cycle.
    ///
    /// Returns the transition if the probe changed state, in which case the
    /// watermark has moved as part of the same critical section.
    pub async fn record(&self, index: usize, outcome: Outcome) -> Option<Transition> {
        let entry = self.entries.get(index)?;

        if !entry.state.read().await.is_edge(&outcome) {
            return None;
        }

        let now = Utc::now();
        let mut watermark = self.watermark.write().await;
        let mut state = entry.state.write().await;

        let (changed, message) = match outcome {
            Outcome::Healthy => (state.mark_healthy(now), None),
            Outcome::Failed(message) => (state.mark_failed(now, message.clone()), Some(message)),
        };
        if !changed {
            return None;
        }
        watermark.bump(now);
        debug!(probe = entry.spec.display_name(), etag = %watermark, "watermark moved");

        Some(Transition {
            name: entry.spec.display_name().to_string(),
            failed: state.failed(),
            since: now,
            message,
        })
    }

    /// Mark a probe that can never run as failed. No transition, no bump.
    pub async fn disable(&self, index: usize, message: impl Into<String>) {
        if let Some(entry) = self.entries.get(index) {
            let _watermark = self.watermark.write().await;
            entry.state.write().await.disable(message);
        }
    }

    /// Consistent copy of every probe's public state.
    pub async fn snapshot(&self) -> Snapshot {
        let watermark = self.watermark.read().await;
        self.collect(*watermark).await
    }

    /// Conditional read: skip the copy when `validator` is still current.
    pub async fn status_view(&self, validator: Option<&str>) -> StatusView {
        let watermark = self.watermark.read().await;
        if validator.is_some_and(|validator| watermark.matches(validator)) {
            return StatusView::Unchanged(*watermark);
        }
        StatusView::Changed(self.collect(*watermark).await)
    }

    async fn collect(&self, etag: Watermark) -> Snapshot {
        let mut probes = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let state = entry.state.read().await;
            probes.push(ProbeStatus::new(&entry.spec, &state));
        }
        Snapshot { etag, probes }
    }
}
