//! Scripted collaborators for exercising the orchestrator offline
//!
//! Used by this crate's tests, by the HTTP layer's tests, and by anything
//! that needs a deterministic reasoner or executor.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::catalog::{RoleCatalog, ToolSpec};
use crate::conversation::Conversation;
use crate::executor::RemoteExecutor;
use crate::invocation::{ToolArguments, ToolInvocation, ToolOutcome};
use crate::reasoner::{Decision, Reasoner, ReasonerError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Catalog with one read tool (`lookup`) and one write tool (`create_item`)
///
/// `editor` sees both, `viewer` sees only the read tool.
pub fn sample_catalog() -> RoleCatalog {
    RoleCatalog::new(vec![
        ToolSpec::read(
            "lookup",
            "Look up an item",
            json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }),
            "read",
        ),
        ToolSpec::write(
            "create_item",
            "Create an item",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "minLength": 1},
                    "idempotency_key": {"type": "string"}
                },
                "required": ["name"]
            }),
            "write",
        ),
    ])
    .grant("editor", ["read", "write"])
    .grant("viewer", ["read"])
}

/// Build an invocation from a JSON arguments literal
pub fn invocation(call_id: &str, name: &str, arguments: Value) -> ToolInvocation {
    ToolInvocation::from_value(call_id, name, arguments)
}

enum Script {
    Queue(Mutex<VecDeque<Result<Decision, ReasonerError>>>),
    Repeat(Decision),
    Numbered(Box<dyn Fn(usize) -> Decision + Send + Sync>),
}

/// Reasoner that plays back a script
///
/// A queued script answers with a final "Done" once exhausted.
pub struct ScriptedReasoner {
    script: Script,
    delay: Option<Duration>,
    seen: Mutex<Vec<Conversation>>,
}

impl ScriptedReasoner {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self::from_results(decisions.into_iter().map(Ok).collect())
    }

    pub fn from_results(results: Vec<Result<Decision, ReasonerError>>) -> Self {
        Self::with_script(Script::Queue(Mutex::new(results.into())))
    }

    /// Always return the same decision
    pub fn repeating(decision: Decision) -> Self {
        Self::with_script(Script::Repeat(decision))
    }

    /// Decision computed from the 1-based step number
    pub fn numbered<F>(f: F) -> Self
    where
        F: Fn(usize) -> Decision + Send + Sync + 'static,
    {
        Self::with_script(Script::Numbered(Box::new(f)))
    }

    /// Sleep before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Conversations the reasoner was shown, in order
    pub fn seen(&self) -> Vec<Conversation> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn decide(
        &self,
        conversation: &Conversation,
        _tools: &[ToolSpec],
    ) -> Result<Decision, ReasonerError> {
        let step = {
            let mut seen = lock(&self.seen);
            seen.push(conversation.clone());
            seen.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.script {
            Script::Queue(queue) => lock(queue)
                .pop_front()
                .unwrap_or_else(|| Ok(Decision::final_answer("Done"))),
            Script::Repeat(decision) => Ok(decision.clone()),
            Script::Numbered(f) => Ok(f(step)),
        }
    }
}

type Responder = Box<dyn Fn(&str, &ToolArguments) -> ToolOutcome + Send + Sync>;

/// Executor that records every call and answers through a responder
pub struct RecordingExecutor {
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
}

impl RecordingExecutor {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &ToolArguments) -> ToolOutcome + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds with `{"tool": name, "arguments": args}`
    pub fn succeeding() -> Self {
        Self::new(|name, arguments| {
            ToolOutcome::success(json!({ "tool": name, "arguments": arguments }))
        })
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _| ToolOutcome::failure(message.clone()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<(String, ToolArguments)> {
        lock(&self.calls).clone()
    }

    pub fn calls_to(&self, name: &str) -> usize {
        lock(&self.calls).iter().filter(|(n, _)| n == name).count()
    }
}

#[async_trait]
impl RemoteExecutor for RecordingExecutor {
    async fn execute(&self, name: &str, arguments: &ToolArguments) -> ToolOutcome {
        lock(&self.calls).push((name.to_string(), arguments.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(name, arguments)
    }
}
