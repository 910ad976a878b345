//! Mutable state of one run

use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::budget::{BudgetCeiling, BudgetTracker};
use crate::catalog::ToolSpec;
use crate::config::BudgetConfig;
use crate::conversation::{Conversation, Turn};
use crate::dedup::CallDeduplicator;
use crate::error::{RunError, RunWarning};
use crate::fingerprint::Fingerprint;
use crate::invocation::ToolInvocation;
use crate::request::RunRequest;
use crate::result::{Artifact, Artifacts, RunOutcome, RunResult, RunUsage, DEFAULT_SUMMARY};

pub(crate) struct RunState {
    pub run_id: Uuid,
    pub conversation: Conversation,
    pub budget: BudgetTracker,
    pub dedup: CallDeduplicator,
    /// Index of this run's first turn; earlier turns came with the handle
    first_turn: usize,
    artifacts: Artifacts,
    warnings: Vec<RunWarning>,
    replayed_calls: usize,
}

impl RunState {
    /// Prior turns from the handle, then the opening user turn
    pub fn new(request: &RunRequest, config: &BudgetConfig) -> Self {
        let prior = request
            .conversation
            .as_ref()
            .map(|handle| handle.turns.clone())
            .unwrap_or_default();
        let first_turn = prior.len();
        let mut conversation = Conversation::from_turns(prior);
        conversation.push(Turn::user(request.opening_turn()));

        Self {
            run_id: request.run_id,
            conversation,
            budget: BudgetTracker::new(config.clone()),
            dedup: CallDeduplicator::new(),
            first_turn,
            artifacts: Artifacts::default(),
            warnings: Vec::new(),
            replayed_calls: 0,
        }
    }

    pub fn warn(&mut self, error: RunError) {
        let warning = error.to_warning();
        warn!(run_id = %self.run_id, kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Answer an invocation with an error result and record the warning
    pub fn reject(&mut self, invocation: &ToolInvocation, error: RunError) {
        self.conversation
            .push(Turn::tool_error(invocation, error.to_string()));
        self.warn(error);
    }

    /// Answer an invocation that was not executed because a ceiling was hit
    pub fn skip(&mut self, invocation: &ToolInvocation, ceiling: &BudgetCeiling) {
        self.conversation.push(Turn::tool_error(
            invocation,
            format!("Not executed: {}", ceiling),
        ));
    }

    pub fn replay(&mut self, invocation: &ToolInvocation, payload: Value) {
        self.replayed_calls += 1;
        self.conversation.push(Turn::tool_result(invocation, payload));
    }

    pub fn record_success(
        &mut self,
        spec: &ToolSpec,
        invocation: &ToolInvocation,
        fingerprint: Fingerprint,
        payload: Value,
    ) {
        self.dedup.record_success(fingerprint.clone(), payload.clone());
        self.artifacts.record(
            spec.is_write,
            Artifact {
                operation: spec.name.clone(),
                fingerprint,
                payload: payload.clone(),
            },
        );
        self.conversation.push(Turn::tool_result(invocation, payload));
    }

    pub fn finish(self, outcome: RunOutcome) -> RunResult {
        let summary = self
            .conversation
            .last_assistant_text_since(self.first_turn)
            .unwrap_or(DEFAULT_SUMMARY)
            .to_string();
        let snapshot = self.budget.snapshot();

        RunResult {
            run_id: self.run_id,
            summary,
            artifacts: self.artifacts,
            warnings: self.warnings,
            usage: RunUsage {
                steps: snapshot.steps,
                tool_calls: snapshot.tool_calls,
                write_calls: snapshot.write_calls,
                replayed_calls: self.replayed_calls,
                elapsed_ms: snapshot.elapsed_ms,
            },
            outcome,
            transcript: self.conversation,
        }
    }
}
