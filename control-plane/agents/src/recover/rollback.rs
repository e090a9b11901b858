use crate::errors::SvcError;
use stor_port::{transport_api::ErrorChain, types::v0::transport::PoolId};

/// An action which undoes a step of the import.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Compensation {
    /// Unmount a pool which the recovery mounted, unless the pool has since been recorded.
    UnmountPool { pool: PoolId },
    /// Delete a pool record created by the recovery.
    DeletePoolRecord { pool: PoolId },
    /// Delete an instance or instance snapshot record created by the recovery.
    DeleteInstanceRecord { project: String, instance: String },
}

impl std::fmt::Display for Compensation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmountPool { pool } => write!(f, "unmount pool '{pool}'"),
            Self::DeletePoolRecord { pool } => write!(f, "delete record of pool '{pool}'"),
            Self::DeleteInstanceRecord { project, instance } => {
                write!(f, "delete record of instance '{instance}' in project '{project}'")
            }
        }
    }
}

/// Runs the compensating actions.
#[async_trait::async_trait]
pub(crate) trait Compensate: Send {
    /// Run the given compensating action.
    async fn compensate(&mut self, action: &Compensation) -> Result<(), SvcError>;
}

/// Ordered stack of the compensating actions of a recovery.
/// Exactly one of `commit` or `abort` must be called.
#[derive(Debug, Default)]
pub(crate) struct Reverter {
    actions: Vec<Compensation>,
}

impl Reverter {
    /// Return a new empty `Self`.
    pub(crate) fn new() -> Self {
        Self::default()
    }
    /// Add a compensating action, to be run before all previously added actions.
    pub(crate) fn add(&mut self, action: Compensation) {
        tracing::trace!(action = %action, "Adding compensating action");
        self.actions.push(action);
    }
    /// The pending actions, in the order they were added.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> &[Compensation] {
        &self.actions
    }
    /// Discard all pending actions without running them.
    pub(crate) fn commit(mut self) {
        self.actions.clear();
    }
    /// Run all pending actions in reverse order.
    /// A failing action is logged and does not prevent the remaining actions from running.
    pub(crate) async fn abort<C: Compensate + ?Sized>(mut self, compensator: &mut C) {
        let actions = std::mem::take(&mut self.actions);
        for action in actions.iter().rev() {
            match compensator.compensate(action).await {
                Ok(()) => tracing::debug!(action = %action, "Reverted"),
                Err(error) => tracing::error!(
                    action = %action,
                    error = error.full_string(),
                    "Failed to revert"
                ),
            }
        }
    }
}

impl Drop for Reverter {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            tracing::warn!(
                pending = self.actions.len(),
                "Reverter dropped with pending compensating actions"
            );
        }
    }
}
