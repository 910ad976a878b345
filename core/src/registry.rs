//! Registry of in-flight runs
//!
//! Maps run ids to cancellation tokens so a run can be aborted from outside
//! the task driving it. Registration is released when the guard drops.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<Uuid, CancellationToken>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a run until the returned guard drops
    pub fn register(&self, run_id: Uuid) -> RunRegistration {
        let token = CancellationToken::new();
        self.runs.insert(run_id, token.clone());
        RunRegistration {
            run_id,
            token,
            runs: Arc::clone(&self.runs),
        }
    }

    /// Cancel a running run; false when the id is not running
    pub fn cancel(&self, run_id: &Uuid) -> bool {
        match self.runs.get(run_id) {
            Some(token) => {
                token.cancel();
                info!(run_id = %run_id, "Run cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, run_id: &Uuid) -> bool {
        self.runs.contains_key(run_id)
    }

    /// Ids of the runs currently registered
    pub fn running_ids(&self) -> Vec<Uuid> {
        self.runs.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Guard for one registered run
#[derive(Debug)]
pub struct RunRegistration {
    run_id: Uuid,
    token: CancellationToken,
    runs: Arc<DashMap<Uuid, CancellationToken>>,
}

impl RunRegistration {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for RunRegistration {
    fn drop(&mut self) {
        self.runs.remove(&self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_registered_run() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        let registration = registry.register(run_id);

        assert!(registry.is_running(&run_id));
        assert!(registry.cancel(&run_id));
        assert!(registration.token().is_cancelled());
    }

    #[test]
    fn test_cancel_unknown_run() {
        assert!(!RunRegistry::new().cancel(&Uuid::new_v4()));
    }

    #[test]
    fn test_guard_drop_unregisters() {
        let registry = RunRegistry::new();
        let run_id = Uuid::new_v4();
        {
            let _registration = registry.register(run_id);
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
        assert!(!registry.cancel(&run_id));
    }
}
