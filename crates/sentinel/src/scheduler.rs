use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::checker::Checker;
use crate::notify::Notifier;
use crate::registry::Registry;
use crate::probe::Probe;
use crate::state::{Outcome, Transition};

/// Per-probe driver: attempts with retries, records the outcome and
/// notifies on transitions.
pub struct PollLoop {
    index: usize,
    probe: Probe,
    registry: Arc<Registry>,
    checker: Arc<dyn Checker>,
    notifier: Arc<dyn Notifier>,
}

impl PollLoop {
    pub fn new(
        index: usize,
        probe: Probe,
        registry: Arc<Registry>,
        checker: Arc<dyn Checker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { index, probe, registry, checker, notifier }
    }

    pub fn probe(&self) -> &Probe {
        &self.probe
    }

    /// Up to `tries` attempts, `retry_delay` apart, stopping at the first
    /// success. Failures inside the budget are invisible to the state.
    pub async fn attempt(&self) -> Outcome {
        let mut outcome = self.checker.check(&self.probe).await;
        let mut attempt = 1;

        while !outcome.is_healthy() && attempt < self.probe.tries {
            debug!(probe = %self.probe.name, attempt, tries = self.probe.tries, "attempt failed, retrying");
            sleep(self.probe.retry_delay).await;
            outcome = self.checker.check(&self.probe).await;
            attempt += 1;
        }

        outcome
    }

    /// One full cycle without the trailing poll sleep.
    pub async fn run_cycle(&self) -> Option<Transition> {
        let outcome = self.attempt().await;
        let transition = self.registry.record(self.index, outcome).await?;

        match &transition.message {
            Some(message) => info!(probe = %self.probe.name, "{}\n{message}", transition.subject()),
            None => info!(probe = %self.probe.name, "{}", transition.subject()),
        }
        self.notifier.notify(&self.probe, &transition);

        Some(transition)
    }

    /// Poll forever.
    pub async fn run(self) {
        loop {
            self.run_cycle().await;
            sleep(self.probe.interval).await;
        }
    }
}

/// Monitoring scheduler - starts one poll loop per configured probe
pub struct Scheduler {
    registry: Arc<Registry>,
    checker: Arc<dyn Checker>,
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(registry: Arc<Registry>, checker: Arc<dyn Checker>, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, checker, notifier }
    }

    /// Build the poll loop of one probe.
    ///
    /// A probe that cannot run is logged once, marked failed for good and
    /// gets no loop.
    pub async fn poll_loop(&self, index: usize) -> Option<PollLoop> {
        let spec = self.registry.spec(index)?;

        match spec.compile() {
            Ok(probe) => Some(PollLoop::new(
                index,
                probe,
                self.registry.clone(),
                self.checker.clone(),
                self.notifier.clone(),
            )),
            Err(e) => {
                error!(probe = %spec.display_name(), "disabled: {e}");
                self.registry.disable(index, e.to_string()).await;
                None
            }
        }
    }

    /// Schedule a single probe for periodic checking
    pub async fn schedule_probe(&self, index: usize) -> Option<JoinHandle<()>> {
        let poll_loop = self.poll_loop(index).await?;
        debug!(
            probe = %poll_loop.probe().name,
            target = poll_loop.probe().target(),
            interval = ?poll_loop.probe().interval,
            "scheduling probe"
        );
        Some(tokio::spawn(poll_loop.run()))
    }

    /// Schedule every probe of the registry
    pub async fn schedule_all(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(self.registry.len());
        for index in 0..self.registry.len() {
            if let Some(handle) = self.schedule_probe(index).await {
                handles.push(handle);
            }
        }
        info!(scheduled = handles.len(), configured = self.registry.len(), "probes scheduled");
        handles
    }
}
