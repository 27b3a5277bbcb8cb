//! Saga state machine.

use common::StockEntryId;
use serde::{Deserialize, Serialize};

/// The state of a create saga.
///
/// State transitions:
/// ```text
/// FetchingSnapshots ──► BuildingAggregate ──► ProcessingStock ──► Persisting ──► Done
///         │                    │                    │                 │
///         └────────────────────┴────────────────────┴─────────────────┴──► Compensating ──► Failed
/// ```
/// The POS flow starts at `BuildingAggregate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    #[default]
    FetchingSnapshots,

    BuildingAggregate,

    /// Atomic sales are being issued line by line.
    ProcessingStock,

    Persisting,

    /// Stock entries recorded so far are being reversed.
    Compensating,

    /// All steps completed successfully (terminal state).
    Done,

    /// The saga ended with an error (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Done | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::FetchingSnapshots => "FetchingSnapshots",
            SagaState::BuildingAggregate => "BuildingAggregate",
            SagaState::ProcessingStock => "ProcessingStock",
            SagaState::Persisting => "Persisting",
            SagaState::Compensating => "Compensating",
            SagaState::Done => "Done",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request-scoped record of one saga execution.
#[derive(Debug, Clone)]
pub struct SagaRun {
    saga: &'static str,
    state: SagaState,
    entries: Vec<StockEntryId>,
    started: std::time::Instant,
}

impl SagaRun {
    pub fn start(saga: &'static str, initial: SagaState) -> Self {
        metrics::counter!("saga_executions_total", "saga" => saga).increment(1);
        Self {
            saga,
            state: initial,
            entries: Vec::new(),
            started: std::time::Instant::now(),
        }
    }

    pub fn saga(&self) -> &'static str {
        self.saga
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Stock entries created so far, in creation order.
    pub fn entries(&self) -> &[StockEntryId] {
        &self.entries
    }

    pub fn advance(&mut self, next: SagaState) {
        tracing::debug!(saga = self.saga, from = %self.state, to = %next, "saga state changed");
        self.state = next;
    }

    pub fn record(&mut self, entry: StockEntryId) {
        self.entries.push(entry);
    }

    /// Marks the run done and records its duration.
    pub fn complete(&mut self) {
        self.advance(SagaState::Done);
        let duration = self.started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds", "saga" => self.saga).record(duration);
        metrics::counter!("saga_completed_total", "saga" => self.saga).increment(1);
        tracing::info!(saga = self.saga, duration, "saga completed successfully");
    }

    /// Marks the run failed and records its duration.
    pub fn fail(&mut self, reason: &str) {
        self.advance(SagaState::Failed);
        let duration = self.started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds", "saga" => self.saga).record(duration);
        metrics::counter!("saga_failed_total", "saga" => self.saga).increment(1);
        tracing::warn!(saga = self.saga, duration, reason, "saga failed");
    }
}
