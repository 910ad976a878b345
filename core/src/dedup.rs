//! Call deduplication
//!
//! Replays cached results for calls that already succeeded in this run and
//! rejects calls whose fingerprint has been requested too often. Failed
//! calls are never cached, so they can be retried until the repetition
//! ceiling stops them.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::budget::BudgetTracker;
use crate::fingerprint::Fingerprint;
use crate::invocation::ToolInvocation;

/// Why a call was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectReason {
    pub tool: String,
    /// Requests for this fingerprint, including the refused one
    pub attempts: usize,
    pub limit: usize,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' requested {} times with identical arguments (limit {})",
            self.tool, self.attempts, self.limit
        )
    }
}

/// Decision for one requested call
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Send it to the executor
    Execute,
    /// Return this cached payload instead of executing
    Replay(Value),
    /// Do not execute or replay
    Reject(RejectReason),
}

/// Per-run cache of successful results keyed by fingerprint
#[derive(Debug, Default)]
pub struct CallDeduplicator {
    cache: HashMap<Fingerprint, Value>,
}

impl CallDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count this request against its fingerprint and decide what to do
    ///
    /// Every request counts, replays included. A request arriving after the
    /// ceiling has been reached is rejected even if a cached result exists.
    pub fn admit(
        &self,
        fingerprint: &Fingerprint,
        invocation: &ToolInvocation,
        budget: &mut BudgetTracker,
    ) -> Admission {
        let limit = budget.config().max_repeated_call_hash;
        let prior = budget.check_fingerprint_repetition(fingerprint);
        let attempts = budget.record_repetition(fingerprint);

        if prior >= limit {
            debug!(
                tool = %invocation.name,
                fingerprint = %fingerprint.short(),
                attempts,
                "Rejecting repeated call"
            );
            return Admission::Reject(RejectReason {
                tool: invocation.name.clone(),
                attempts,
                limit,
            });
        }

        match self.cache.get(fingerprint) {
            Some(payload) => {
                debug!(
                    tool = %invocation.name,
                    fingerprint = %fingerprint.short(),
                    "Replaying cached result"
                );
                Admission::Replay(payload.clone())
            }
            None => Admission::Execute,
        }
    }

    /// Cache a successful payload; the first stored result wins
    pub fn record_success(&mut self, fingerprint: Fingerprint, payload: Value) {
        self.cache.entry(fingerprint).or_insert(payload);
    }

    pub fn cached(&self, fingerprint: &Fingerprint) -> Option<&Value> {
        self.cache.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
