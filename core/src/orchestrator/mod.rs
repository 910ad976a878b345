//! Orchestration loop
//!
//! A run moves through three phases until it terminates:
//!
//! - Deciding: check the deadline, charge a step, consult the reasoner.
//! - Acting: admit, validate, execute or replay each requested invocation
//!   in order, appending one tool-result turn per invocation.
//! - Checking: stop on a budget breach or when the step ceiling is reached.
//!
//! A decision without invocations completes the run. Reasoner failures
//! terminate it. Tool failures, rejections and invalid arguments are fed
//! back to the reasoner as error results and the run continues.

mod guard;
mod state;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::budget::{BudgetCeiling, ChargeKind};
use crate::catalog::{validate_arguments, ToolCatalog, ToolSpec};
use crate::config::BudgetConfig;
use crate::conversation::{Conversation, Turn};
use crate::dedup::Admission;
use crate::error::{RunCancelled, RunError};
use crate::executor::RemoteExecutor;
use crate::fingerprint::Fingerprint;
use crate::invocation::{ToolInvocation, ToolOutcome};
use crate::reasoner::Reasoner;
use crate::request::RunRequest;
use crate::result::{Artifacts, RunOutcome, RunResult, RunUsage, NO_TOOLS_SUMMARY};

use guard::{guarded, Guarded};
use state::RunState;

/// Prefix of idempotency keys derived for write calls that lack one
const DERIVED_KEY_PREFIX: &str = "sw-";

enum InvocationFlow {
    Continue,
    AbortRound(BudgetCeiling),
}

pub struct Orchestrator {
    config: BudgetConfig,
    catalog: Arc<dyn ToolCatalog>,
    reasoner: Arc<dyn Reasoner>,
}

impl Orchestrator {
    pub fn new(config: BudgetConfig, catalog: Arc<dyn ToolCatalog>, reasoner: Arc<dyn Reasoner>) -> Self {
        Self {
            config,
            catalog,
            reasoner,
        }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn ToolCatalog> {
        &self.catalog
    }

    /// Run to completion; never fails
    pub async fn run(&self, request: RunRequest, executor: &dyn RemoteExecutor) -> RunResult {
        let run_id = request.run_id;
        self.run_cancellable(request, executor, CancellationToken::new())
            .await
            .unwrap_or_else(|_| RunResult::abandoned(run_id))
    }

    /// Run until a terminal state or until `cancel` fires
    #[instrument(name = "run", skip_all, fields(run_id = %request.run_id, user_id = request.principal.user_id))]
    pub async fn run_cancellable(
        &self,
        request: RunRequest,
        executor: &dyn RemoteExecutor,
        cancel: CancellationToken,
    ) -> Result<RunResult, RunCancelled> {
        let tools = self.catalog.available_tools(&request.principal.roles);
        if tools.is_empty() {
            return Ok(self.no_tools_result(&request));
        }

        info!(tools = tools.len(), "Starting run");
        let mut run = RunState::new(&request, &self.config);

        let outcome = loop {
            if run.budget.check_deadline() {
                run.warn(RunError::BudgetExceeded(BudgetCeiling::Deadline {
                    seconds: self.config.deadline_seconds,
                }));
                break RunOutcome::Terminated;
            }

            run.budget.charge(ChargeKind::Step);
            info!(step = run.budget.steps(), max_steps = self.config.max_steps, "Consulting reasoner");

            let limit = run.budget.call_timeout();
            let decision = match guarded(self.reasoner.decide(&run.conversation, &tools), limit, &cancel).await {
                Guarded::Done(Ok(decision)) => decision,
                Guarded::Done(Err(e)) => {
                    run.warn(RunError::ReasonerUnavailable(e.to_string()));
                    break RunOutcome::Terminated;
                }
                Guarded::TimedOut => {
                    run.warn(RunError::ReasonerUnavailable(format!(
                        "no decision within {}ms",
                        limit.as_millis()
                    )));
                    break RunOutcome::Terminated;
                }
                Guarded::Cancelled => return Err(self.cancelled(&run)),
            };

            run.conversation.push(Turn::assistant(
                decision.answer_text.clone(),
                decision.invocations.clone(),
            ));

            if decision.invocations.is_empty() {
                if !decision.is_final {
                    debug!("Reasoner returned no invocations without a final flag");
                }
                break RunOutcome::Completed;
            }

            info!(requested = decision.invocations.len(), "Acting on tool calls");
            self.act(&mut run, &tools, decision.invocations, executor, &cancel)
                .await?;

            run.budget.check_deadline();
            if let Some(ceiling) = run.budget.is_exhausted() {
                run.warn(RunError::BudgetExceeded(ceiling));
                break RunOutcome::Terminated;
            }
            if run.budget.steps_exhausted() {
                run.warn(RunError::BudgetExceeded(BudgetCeiling::Steps {
                    limit: self.config.max_steps,
                }));
                break RunOutcome::Terminated;
            }
        };

        let result = run.finish(outcome);
        info!(
            outcome = ?result.outcome,
            steps = result.usage.steps,
            tool_calls = result.usage.tool_calls,
            write_calls = result.usage.write_calls,
            warnings = result.warnings.len(),
            "Run finished"
        );
        Ok(result)
    }

    async fn act(
        &self,
        run: &mut RunState,
        tools: &[ToolSpec],
        invocations: Vec<ToolInvocation>,
        executor: &dyn RemoteExecutor,
        cancel: &CancellationToken,
    ) -> Result<(), RunCancelled> {
        let mut pending = invocations.into_iter();
        while let Some(invocation) = pending.next() {
            if let InvocationFlow::AbortRound(ceiling) =
                self.act_one(run, tools, invocation, executor, cancel).await?
            {
                for skipped in pending.by_ref() {
                    run.skip(&skipped, &ceiling);
                }
                break;
            }
        }
        Ok(())
    }

    async fn act_one(
        &self,
        run: &mut RunState,
        tools: &[ToolSpec],
        invocation: ToolInvocation,
        executor: &dyn RemoteExecutor,
        cancel: &CancellationToken,
    ) -> Result<InvocationFlow, RunCancelled> {
        let Some(spec) = tools.iter().find(|tool| tool.name == invocation.name) else {
            let tool = invocation.name.clone();
            run.reject(&invocation, RunError::UnknownTool(tool));
            return Ok(InvocationFlow::Continue);
        };

        let invocation = with_derived_key(spec, invocation);
        let fingerprint = Fingerprint::of(&invocation);

        match run.dedup.admit(&fingerprint, &invocation, &mut run.budget) {
            Admission::Execute => {}
            Admission::Replay(payload) => {
                run.replay(&invocation, payload);
                return Ok(InvocationFlow::Continue);
            }
            Admission::Reject(reason) => {
                run.reject(
                    &invocation,
                    RunError::DuplicateRejected {
                        tool: reason.tool,
                        attempts: reason.attempts,
                        limit: reason.limit,
                    },
                );
                return Ok(InvocationFlow::Continue);
            }
        }

        if let Err(e) = validate_arguments(spec, &invocation.arguments) {
            run.reject(
                &invocation,
                RunError::InvalidArguments {
                    tool: spec.name.clone(),
                    message: e.to_string(),
                },
            );
            return Ok(InvocationFlow::Continue);
        }

        if let Err(ceiling) = run.budget.try_reserve(spec.is_write) {
            run.skip(&invocation, &ceiling);
            return Ok(InvocationFlow::AbortRound(ceiling));
        }

        debug!(tool = %spec.name, fingerprint = %fingerprint.short(), "Executing tool");
        let limit = run.budget.call_timeout();
        let outcome = match guarded(executor.execute(&invocation.name, &invocation.arguments), limit, cancel).await {
            Guarded::Done(outcome) => outcome,
            Guarded::TimedOut => ToolOutcome::failure(format!("timed out after {}ms", limit.as_millis())),
            Guarded::Cancelled => return Err(self.cancelled(run)),
        };

        run.budget.charge(ChargeKind::ToolCall);
        if spec.is_write {
            run.budget.charge(ChargeKind::WriteCall);
        }

        if outcome.success {
            run.record_success(spec, &invocation, fingerprint, outcome.payload);
        } else {
            run.reject(
                &invocation,
                RunError::ToolExecutionFailure {
                    tool: spec.name.clone(),
                    message: outcome.error_message().to_string(),
                },
            );
        }
        Ok(InvocationFlow::Continue)
    }

    fn cancelled(&self, run: &RunState) -> RunCancelled {
        info!(steps = run.budget.steps(), "Run cancelled");
        RunCancelled { run_id: run.run_id }
    }

    fn no_tools_result(&self, request: &RunRequest) -> RunResult {
        let error = RunError::Configuration {
            roles: request.principal.roles.to_string(),
        };
        let warning = error.to_warning();
        tracing::warn!(roles = %request.principal.roles, "{}", warning.message);

        let transcript = request
            .conversation
            .as_ref()
            .map(|handle| Conversation::from_turns(handle.turns.clone()))
            .unwrap_or_default();

        RunResult {
            run_id: request.run_id,
            summary: NO_TOOLS_SUMMARY.to_string(),
            artifacts: Artifacts::default(),
            warnings: vec![warning],
            usage: RunUsage::default(),
            outcome: RunOutcome::Terminated,
            transcript,
        }
    }
}

/// Give keyless write calls a key derived from their arguments
///
/// Identical arguments derive identical keys, so a keyless call and its
/// repeats still share one fingerprint.
fn with_derived_key(spec: &ToolSpec, invocation: ToolInvocation) -> ToolInvocation {
    if !spec.is_write || !spec.accepts_idempotency_key() || invocation.idempotency_key.is_some() {
        return invocation;
    }
    let derived = Fingerprint::compute(&invocation.name, &invocation.arguments, None);
    let key = format!("{}{}", DERIVED_KEY_PREFIX, derived.short());
    invocation.with_idempotency_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::IDEMPOTENCY_KEY_ARG;
    use serde_json::json;

    fn spec_with_key() -> ToolSpec {
        ToolSpec::write(
            "create_task",
            "",
            json!({"type": "object", "properties": {"subject": {"type": "string"}, "idempotency_key": {"type": "string"}}}),
            "add_task",
        )
    }

    #[test]
    fn test_derived_key_is_deterministic() {
        let a = with_derived_key(
            &spec_with_key(),
            ToolInvocation::from_value("c1", "create_task", json!({"subject": "x"})),
        );
        let b = with_derived_key(
            &spec_with_key(),
            ToolInvocation::from_value("c2", "create_task", json!({"subject": "x"})),
        );
        assert_eq!(a.idempotency_key, b.idempotency_key);
        assert!(a.idempotency_key.as_deref().unwrap_or_default().starts_with("sw-"));
        assert_eq!(a.arguments[IDEMPOTENCY_KEY_ARG], json!(a.idempotency_key.clone().unwrap()));
    }

    #[test]
    fn test_supplied_key_kept() {
        let invocation = with_derived_key(
            &spec_with_key(),
            ToolInvocation::from_value("c1", "create_task", json!({"subject": "x", "idempotency_key": "mine"})),
        );
        assert_eq!(invocation.idempotency_key.as_deref(), Some("mine"));
    }

    #[test]
    fn test_reads_never_get_keys() {
        let spec = ToolSpec::read(
            "get_story_tasks",
            "",
            json!({"type": "object", "properties": {"idempotency_key": {"type": "string"}}}),
            "view",
        );
        let invocation = with_derived_key(&spec, ToolInvocation::from_value("c1", "get_story_tasks", json!({})));
        assert!(invocation.idempotency_key.is_none());
    }
}
