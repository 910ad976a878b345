//! Run budget tracking
//!
//! Enforces per-run ceilings on:
//! - Wall-clock time (deadline)
//! - Reasoner consultations (steps)
//! - Executed tool calls, and executed writes among them
//! - Requests for the same fingerprint
//!
//! Ceilings are fixed when the tracker is created and counters only grow.
//! A breach is latched: once reported it stays reported.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::BudgetConfig;
use crate::fingerprint::Fingerprint;

/// A counter the orchestrator charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargeKind {
    Step,
    ToolCall,
    WriteCall,
}

/// Which ceiling a run hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ceiling", rename_all = "snake_case")]
pub enum BudgetCeiling {
    Deadline { seconds: u64 },
    Steps { limit: usize },
    ToolCalls { limit: usize },
    WriteCalls { limit: usize },
    Repetition { limit: usize },
}

impl fmt::Display for BudgetCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetCeiling::Deadline { seconds } => write!(f, "Deadline exceeded ({}s)", seconds),
            BudgetCeiling::Steps { limit } => write!(f, "Max steps reached (limit {})", limit),
            BudgetCeiling::ToolCalls { limit } => {
                write!(f, "Max tool calls exceeded (limit {})", limit)
            }
            BudgetCeiling::WriteCalls { limit } => {
                write!(f, "Max write calls exceeded (limit {})", limit)
            }
            BudgetCeiling::Repetition { limit } => {
                write!(f, "Repeated call limit exceeded (limit {})", limit)
            }
        }
    }
}

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub steps: usize,
    pub tool_calls: usize,
    pub write_calls: usize,
    pub elapsed_ms: u64,
}

/// Per-run budget tracker
#[derive(Debug)]
pub struct BudgetTracker {
    config: BudgetConfig,
    started: Instant,
    steps: usize,
    tool_calls: usize,
    write_calls: usize,
    repetitions: HashMap<Fingerprint, usize>,
    deadline_passed: bool,
    repetition_breached: bool,
    /// Capacity ceiling hit by a refused reservation
    refused: Option<BudgetCeiling>,
}

impl BudgetTracker {
    /// Create a tracker whose clock starts now
    pub fn new(config: BudgetConfig) -> Self {
        Self::started_at(config, Instant::now())
    }

    pub fn started_at(config: BudgetConfig, started: Instant) -> Self {
        Self {
            config,
            started,
            steps: 0,
            tool_calls: 0,
            write_calls: 0,
            repetitions: HashMap::new(),
            deadline_passed: false,
            repetition_breached: false,
            refused: None,
        }
    }

    /// Increment one counter
    pub fn charge(&mut self, kind: ChargeKind) {
        match kind {
            ChargeKind::Step => self.steps = self.steps.saturating_add(1),
            ChargeKind::ToolCall => self.tool_calls = self.tool_calls.saturating_add(1),
            ChargeKind::WriteCall => self.write_calls = self.write_calls.saturating_add(1),
        }
    }

    /// How many times `fingerprint` has been requested so far
    pub fn check_fingerprint_repetition(&self, fingerprint: &Fingerprint) -> usize {
        self.repetitions.get(fingerprint).copied().unwrap_or(0)
    }

    /// Count one more request for `fingerprint`, returning the new count
    pub fn record_repetition(&mut self, fingerprint: &Fingerprint) -> usize {
        let count = self.repetitions.entry(fingerprint.clone()).or_insert(0);
        *count = count.saturating_add(1);
        if *count > self.config.max_repeated_call_hash {
            self.repetition_breached = true;
        }
        *count
    }

    /// Check whether one more executed call fits
    ///
    /// Nothing is charged. A refusal is latched and reported by
    /// [`is_exhausted`](Self::is_exhausted) from then on.
    pub fn try_reserve(&mut self, is_write: bool) -> Result<(), BudgetCeiling> {
        if self.tool_calls >= self.config.max_total_tool_calls {
            let ceiling = BudgetCeiling::ToolCalls {
                limit: self.config.max_total_tool_calls,
            };
            self.refused.get_or_insert(ceiling);
            return Err(ceiling);
        }
        if is_write && self.write_calls >= self.config.max_write_calls {
            let ceiling = BudgetCeiling::WriteCalls {
                limit: self.config.max_write_calls,
            };
            self.refused.get_or_insert(ceiling);
            return Err(ceiling);
        }
        Ok(())
    }

    /// Latch the deadline if it has passed; returns whether it has
    pub fn check_deadline(&mut self) -> bool {
        if !self.deadline_passed && self.elapsed() >= self.config.deadline() {
            self.deadline_passed = true;
        }
        self.deadline_passed
    }

    /// First latched breach, if any
    ///
    /// Reads latched state only. Call [`check_deadline`](Self::check_deadline)
    /// first to pick up the passage of time.
    pub fn is_exhausted(&self) -> Option<BudgetCeiling> {
        if self.deadline_passed {
            return Some(BudgetCeiling::Deadline {
                seconds: self.config.deadline_seconds,
            });
        }
        if let Some(ceiling) = self.refused {
            return Some(ceiling);
        }
        if self.tool_calls > self.config.max_total_tool_calls {
            return Some(BudgetCeiling::ToolCalls {
                limit: self.config.max_total_tool_calls,
            });
        }
        if self.write_calls > self.config.max_write_calls {
            return Some(BudgetCeiling::WriteCalls {
                limit: self.config.max_write_calls,
            });
        }
        if self.repetition_breached {
            return Some(BudgetCeiling::Repetition {
                limit: self.config.max_repeated_call_hash,
            });
        }
        None
    }

    /// Whether the reasoner has been consulted the maximum number of times
    pub fn steps_exhausted(&self) -> bool {
        self.steps >= self.config.max_steps
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.config.deadline().saturating_sub(self.elapsed())
    }

    /// Timeout for the next collaborator call
    ///
    /// The configured per-call timeout, shortened so the call cannot run
    /// past the deadline by more than the overrun grace.
    pub fn call_timeout(&self) -> Duration {
        self.config
            .call_timeout()
            .min(self.remaining() + self.config.overrun_grace())
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn tool_calls(&self) -> usize {
        self.tool_calls
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            steps: self.steps,
            tool_calls: self.tool_calls,
            write_calls: self.write_calls,
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }
}
