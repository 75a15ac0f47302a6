//! Per-browser session state and the interaction state machine.
//!
//! `Idle -> Searching -> ResultsShown -> PlanPending -> PlanShown`, with a new
//! search allowed from any settled phase. Calls to the APIs happen outside the
//! store lock; a [`BusyGuard`] puts the session back into a settled phase if
//! the call is abandoned.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::finder::DayCount;
use crate::llm::{Failure, LlmError};
use crate::strategy::StrategyWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    ResultsShown,
    PlanPending,
    PlanShown,
}

impl Phase {
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Searching | Phase::PlanPending)
    }
}

/// Non-fatal, shown inline above the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("Please enter a topic to search.")]
    EmptyTopic,
    #[error("A request is already running for this session. Please wait for it to finish.")]
    Busy,
    #[error("Find content first; a plan needs search results to build on.")]
    NoResults,
    #[error("{0}")]
    InvalidInput(String),
}

/// Text from a finished call, or why it failed.
pub type Outcome = Result<String, Failure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub topic: String,
    pub weights: StrategyWeights,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanQuery {
    pub results: String,
    pub days: DayCount,
    pub weights: StrategyWeights,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    phase: Phase,
    topic: String,
    weights: StrategyWeights,
    days: DayCount,
    search: Option<Outcome>,
    plan: Option<Outcome>,
    warning: Option<Warning>,
    last_seen: Instant,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            topic: String::new(),
            weights: StrategyWeights::default(),
            days: DayCount::default(),
            search: None,
            plan: None,
            warning: None,
            last_seen: Instant::now(),
        }
    }
}

impl SessionContext {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn weights(&self) -> &StrategyWeights {
        &self.weights
    }

    pub fn days(&self) -> DayCount {
        self.days
    }

    pub fn search(&self) -> Option<&Outcome> {
        self.search.as_ref()
    }

    pub fn plan(&self) -> Option<&Outcome> {
        self.plan.as_ref()
    }

    #[cfg(test)]
    pub fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    /// Warnings are shown once.
    pub fn take_warning(&mut self) -> Option<Warning> {
        self.warning.take()
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(phase = ?self.phase, "{}", warning);
        self.warning = Some(warning);
    }

    /// Moves to `Searching` and clears any previous plan.
    pub fn begin_search(
        &mut self,
        topic: &str,
        weights: StrategyWeights,
    ) -> Result<SearchQuery, Warning> {
        if self.phase.is_busy() {
            self.warn(Warning::Busy);
            return Err(Warning::Busy);
        }

        self.topic = topic.to_string();
        self.weights = weights;

        let topic = topic.trim();
        if topic.is_empty() {
            self.warn(Warning::EmptyTopic);
            return Err(Warning::EmptyTopic);
        }

        self.warning = None;
        self.plan = None;
        self.phase = Phase::Searching;
        Ok(SearchQuery {
            topic: topic.to_string(),
            weights,
        })
    }

    pub fn finish_search(&mut self, outcome: Result<String, LlmError>) {
        if self.phase != Phase::Searching {
            tracing::debug!(phase = ?self.phase, "Dropping search result for settled session");
            return;
        }
        self.search = Some(outcome.map_err(Failure::from));
        self.phase = Phase::ResultsShown;
    }

    /// Needs a successful search result to build on.
    pub fn begin_plan(&mut self, days: DayCount) -> Result<PlanQuery, Warning> {
        if self.phase.is_busy() {
            self.warn(Warning::Busy);
            return Err(Warning::Busy);
        }

        self.days = days;
        let results = match &self.search {
            Some(Ok(text)) => text.clone(),
            _ => {
                self.warn(Warning::NoResults);
                return Err(Warning::NoResults);
            }
        };

        self.warning = None;
        self.phase = Phase::PlanPending;
        Ok(PlanQuery {
            results,
            days,
            weights: self.weights,
        })
    }

    pub fn finish_plan(&mut self, outcome: Result<String, LlmError>) {
        if self.phase != Phase::PlanPending {
            tracing::debug!(phase = ?self.phase, "Dropping plan result for settled session");
            return;
        }
        self.plan = Some(outcome.map_err(Failure::from));
        self.phase = Phase::PlanShown;
    }

    /// Leaves a busy phase without a result.
    pub fn abandon(&mut self) {
        if self.phase.is_busy() {
            tracing::warn!(phase = ?self.phase, "Request abandoned before completion");
            self.phase = self.settled_phase();
        }
    }

    /// PDF export needs both texts.
    pub fn export_texts(&self) -> Option<(&str, &str)> {
        match (&self.search, &self.plan) {
            (Some(Ok(search)), Some(Ok(plan))) => Some((search.as_str(), plan.as_str())),
            _ => None,
        }
    }

    fn settled_phase(&self) -> Phase {
        if self.plan.is_some() {
            Phase::PlanShown
        } else if self.search.is_some() {
            Phase::ResultsShown
        } else {
            Phase::Idle
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionContext>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Runs `f` on the session, creating it if needed. Expired sessions are
    /// dropped first. Never call this across an `.await`.
    pub fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, s| s.last_seen.elapsed() <= ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped idle sessions");
        }

        let session = sessions.entry(id).or_default();
        session.last_seen = Instant::now();
        f(session)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held while a call is in flight. Dropping it without [`BusyGuard::complete`]
/// abandons the call.
pub struct BusyGuard<'a> {
    store: &'a SessionStore,
    id: Uuid,
    armed: bool,
}

impl<'a> BusyGuard<'a> {
    pub fn new(store: &'a SessionStore, id: Uuid) -> Self {
        Self {
            store,
            id,
            armed: true,
        }
    }

    pub fn complete<R>(mut self, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        self.armed = false;
        self.store.with_session(self.id, f)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.with_session(self.id, SessionContext::abandon);
        }
    }
}
