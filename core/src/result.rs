//! Run results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::conversation::Conversation;
use crate::error::{RunWarning, WarningKind};
use crate::fingerprint::Fingerprint;

/// Summary used when the caller's roles expose no tools
pub const NO_TOOLS_SUMMARY: &str = "No tools available for your role";

/// Summary used when the reasoner produced no final text
pub const DEFAULT_SUMMARY: &str = "Task completed";

/// Summary used when a run is abandoned before reaching a terminal state
pub const ABANDONED_SUMMARY: &str = "Run cancelled";

/// A successful tool call worth reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub operation: String,
    pub fingerprint: Fingerprint,
    pub payload: Value,
}

/// Successful writes and reads of a run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub created: Vec<Artifact>,
    pub observed: Vec<Artifact>,
}

impl Artifacts {
    pub fn record(&mut self, is_write: bool, artifact: Artifact) {
        let bucket = if is_write {
            &mut self.created
        } else {
            &mut self.observed
        };
        if bucket.iter().all(|a| a.fingerprint != artifact.fingerprint) {
            bucket.push(artifact);
        }
    }

    /// Created artifacts produced by `operation`
    pub fn created_by<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a Artifact> {
        self.created.iter().filter(move |a| a.operation == operation)
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.observed.is_empty()
    }
}

/// Counters consumed by a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunUsage {
    pub steps: usize,
    pub tool_calls: usize,
    pub write_calls: usize,
    pub replayed_calls: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The reasoner gave a final answer
    Completed,
    /// The run was stopped by a budget, failure or configuration problem
    Terminated,
}

/// Final output of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub summary: String,
    pub artifacts: Artifacts,
    pub warnings: Vec<RunWarning>,
    pub usage: RunUsage,
    pub outcome: RunOutcome,
    /// Full transcript, for callers that keep conversations
    #[serde(skip)]
    pub transcript: Conversation,
}

impl RunResult {
    /// Result for a run that never reached a terminal state
    pub fn abandoned(run_id: Uuid) -> Self {
        Self {
            run_id,
            summary: ABANDONED_SUMMARY.to_string(),
            artifacts: Artifacts::default(),
            warnings: Vec::new(),
            usage: RunUsage::default(),
            outcome: RunOutcome::Terminated,
            transcript: Conversation::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &RunWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
