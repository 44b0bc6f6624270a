use chrono::{DateTime, SecondsFormat, Utc};

/// Result of one poll cycle (after retries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Healthy,
    /// Diagnostic text of the last failed attempt.
    Failed(String),
}

impl Outcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Outcome::Healthy)
    }
}

/// Public health of one probe.
///
/// Only ever mutated behind the probe's lock in the registry, so readers see
/// the `(failed, since, last_error)` triple as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthState {
    failed: bool,
    since: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl HealthState {
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Time of the last transition; `None` until the first one.
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// RFC 3339 rendering of [`HealthState::since`].
    pub fn since_rfc3339(&self) -> Option<String> {
        self.since.map(|since| since.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether applying `outcome` would flip the state.
    pub fn is_edge(&self, outcome: &Outcome) -> bool {
        self.failed == outcome.is_healthy()
    }

    /// Returns `true` if this was a transition.
    pub fn mark_failed(&mut self, now: DateTime<Utc>, message: impl Into<String>) -> bool {
        if self.failed {
            return false;
        }
        self.failed = true;
        self.since = Some(now);
        self.last_error = Some(message.into());
        true
    }

    /// Returns `true` if this was a transition.
    pub fn mark_healthy(&mut self, now: DateTime<Utc>) -> bool {
        if !self.failed {
            return false;
        }
        self.failed = false;
        self.since = Some(now);
        self.last_error = None;
        true
    }

    /// Permanently failed because the probe cannot run at all.
    /// This is not a transition: `since` is left untouched.
    pub fn disable(&mut self, message: impl Into<String>) {
        self.failed = true;
        self.last_error = Some(message.into());
    }
}

/// A change of a probe's health, handed to the notifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    pub failed: bool,
    pub since: DateTime<Utc>,
    /// Failure text; `None` on recovery.
    pub message: Option<String>,
}

impl Transition {
    /// `Failed: <name>` or `Fixed: <name>`.
    pub fn subject(&self) -> String {
        if self.failed { format!("Failed: {}", self.name) } else { format!("Fixed: {}", self.name) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = HealthState::default();
        assert!(!state.failed());
        assert!(state.since().is_none());
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_transitions_only_on_edges() {
        let mut state = HealthState::default();
        let now = Utc::now();

        assert!(!state.mark_healthy(now));
        assert!(state.since().is_none());

        assert!(state.mark_failed(now, "boom"));
        assert_eq!(state.last_error(), Some("boom"));
        assert_eq!(state.since(), Some(now));

        let later = now + chrono::Duration::seconds(5);
        assert!(!state.mark_failed(later, "still broken"));
        assert_eq!(state.last_error(), Some("boom"));
        assert_eq!(state.since(), Some(now));

        assert!(state.mark_healthy(later));
        assert!(!state.failed());
        assert!(state.last_error().is_none());
        assert_eq!(state.since(), Some(later));
    }

    #[test]
    fn test_is_edge() {
        let mut state = HealthState::default();
        assert!(!state.is_edge(&Outcome::Healthy));
        assert!(state.is_edge(&Outcome::Failed("x".into())));
        state.mark_failed(Utc::now(), "x");
        assert!(state.is_edge(&Outcome::Healthy));
        assert!(!state.is_edge(&Outcome::Failed("y".into())));
    }

    #[test]
    fn test_disable_is_not_a_transition() {
        let mut state = HealthState::default();
        state.disable("bad config");
        assert!(state.failed());
        assert!(state.since().is_none());
    }

    #[test]
    fn test_subject() {
        let mut transition = Transition {
            name: "api".into(),
            failed: true,
            since: Utc::now(),
            message: Some("503".into()),
        };
        assert_eq!(transition.subject(), "Failed: api");
        transition.failed = false;
        assert_eq!(transition.subject(), "Fixed: api");
    }
}
