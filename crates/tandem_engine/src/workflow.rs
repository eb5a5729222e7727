//! Manual conflict resolution.

use crate::error::{SyncError, SyncResult};
use crate::session::ClientSyncSession;
use tandem_protocol::{ConflictResolution, Delta, VersionConflict};
use tracing::info;

/// State of the conflict workflow.
///
/// ```text
/// Idle ──► Conflicted ──► Resolved
///               │
///               └──────► Cancelled
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// No conflict has been raised.
    #[default]
    Idle,
    /// Waiting for the user to choose.
    Conflicted,
    /// The user chose a resolution.
    Resolved(ConflictResolution),
    /// The user dismissed the prompt.
    Cancelled,
}

impl WorkflowState {
    /// Short name for errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Conflicted => "conflicted",
            WorkflowState::Resolved(_) => "resolved",
            WorkflowState::Cancelled => "cancelled",
        }
    }
}

/// The prompt shown when automatic reconciliation gives up.
///
/// Holds the local content as it was when the conflict surfaced, next to
/// the server's current state. There is no algorithmic merge here: the
/// user keeps one side or supplies merged text.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolutionWorkflow {
    state: WorkflowState,
    local_content: Option<String>,
    conflict: Option<VersionConflict>,
}

impl ConflictResolutionWorkflow {
    /// Creates an idle workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Returns true while a choice is outstanding.
    pub fn is_conflicted(&self) -> bool {
        self.state == WorkflowState::Conflicted
    }

    /// Local content captured when the conflict surfaced.
    pub fn local_content(&self) -> Option<&str> {
        self.local_content.as_deref()
    }

    /// Server state named by the conflict.
    pub fn conflict(&self) -> Option<&VersionConflict> {
        self.conflict.as_ref()
    }

    /// Opens the prompt.
    pub fn enter(&mut self, local_content: impl Into<String>, conflict: VersionConflict) -> SyncResult<()> {
        if self.is_conflicted() {
            return Err(self.invalid("conflicted"));
        }
        info!(
            version = conflict.current_version,
            last_edited_by = conflict.last_edited_by.as_deref().unwrap_or("-"),
            "conflict needs resolution"
        );
        self.local_content = Some(local_content.into());
        self.conflict = Some(conflict);
        self.state = WorkflowState::Conflicted;
        Ok(())
    }

    /// Applies the user's choice to `session`.
    ///
    /// The session is first reset to the server state named by the conflict.
    /// `KeepLocal` and `Merged` then queue one fresh delta from that content
    /// to the chosen text, which is returned; `AcceptRemote` queues nothing.
    pub fn resolve(
        &mut self,
        resolution: ConflictResolution,
        session: &mut ClientSyncSession,
    ) -> SyncResult<Option<Delta>> {
        if !self.is_conflicted() {
            return Err(self.invalid("resolved"));
        }
        let (Some(conflict), Some(local)) = (self.conflict.as_ref(), self.local_content.as_ref())
        else {
            return Err(SyncError::Protocol("conflict workflow lost its state".into()));
        };

        session.reset(conflict.current_content.clone(), conflict.current_version);
        let target = match &resolution {
            ConflictResolution::Merged(text) => text.as_str(),
            ConflictResolution::KeepLocal | ConflictResolution::AcceptRemote => local.as_str(),
        };
        let delta = resolution
            .submits()
            .then(|| session.local_edit(target))
            .filter(|delta| !delta.is_empty());

        info!(
            document = session.document_id(),
            resolution = resolution.as_str(),
            version = conflict.current_version,
            "conflict resolved"
        );
        self.state = WorkflowState::Resolved(resolution);
        Ok(delta)
    }

    /// Dismisses the prompt without touching the session.
    pub fn cancel(&mut self) -> SyncResult<()> {
        if !self.is_conflicted() {
            return Err(self.invalid("cancelled"));
        }
        self.state = WorkflowState::Cancelled;
        Ok(())
    }

    fn invalid(&self, to: &str) -> SyncError {
        SyncError::InvalidStateTransition {
            from: self.state.name().to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflicted(local: &str) -> ConflictResolutionWorkflow {
        let mut workflow = ConflictResolutionWorkflow::new();
        workflow
            .enter(local, VersionConflict::new(6, "axb", Some("alice".into())))
            .unwrap();
        workflow
    }

    #[test]
    fn starts_idle() {
        let workflow = ConflictResolutionWorkflow::new();
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(workflow.conflict().is_none());
    }

    #[test]
    fn keep_local_submits_local_over_server() {
        let mut session = ClientSyncSession::new("doc", "ayb", 5);
        let mut workflow = conflicted("ayb");

        let delta = workflow
            .resolve(ConflictResolution::KeepLocal, &mut session)
            .unwrap()
            .unwrap();

        assert_eq!(delta.apply("axb"), "ayb");
        assert_eq!(session.base_version(), 6);
        assert_eq!(session.content(), "ayb");
        assert_eq!(session.pending_count(), 1);
        assert_eq!(
            workflow.state(),
            &WorkflowState::Resolved(ConflictResolution::KeepLocal)
        );
    }

    #[test]
    fn accept_remote_discards_local() {
        let mut session = ClientSyncSession::new("doc", "ayb", 5);
        session.local_edit("aybz");
        let mut workflow = conflicted("aybz");

        let delta = workflow
            .resolve(ConflictResolution::AcceptRemote, &mut session)
            .unwrap();

        assert!(delta.is_none());
        assert_eq!(session.content(), "axb");
        assert_eq!(session.base_version(), 6);
        assert!(!session.has_pending());
    }

    #[test]
    fn merged_text_is_submitted() {
        let mut session = ClientSyncSession::new("doc", "ayb", 5);
        let mut workflow = conflicted("ayb");

        let delta = workflow
            .resolve(ConflictResolution::Merged("axyb".into()), &mut session)
            .unwrap()
            .unwrap();

        assert_eq!(delta, Delta::new().retain(2).insert("y").retain(1));
        assert_eq!(session.content(), "axyb");
    }

    #[test]
    fn merged_text_equal_to_server_queues_nothing() {
        let mut session = ClientSyncSession::new("doc", "ayb", 5);
        let mut workflow = conflicted("ayb");

        let delta = workflow
            .resolve(ConflictResolution::Merged("axb".into()), &mut session)
            .unwrap();
        assert!(delta.is_none());
        assert!(!session.has_pending());
    }

    #[test]
    fn cancel_leaves_session_alone() {
        let mut session = ClientSyncSession::new("doc", "ayb", 5);
        session.local_edit("aybz");
        let mut workflow = conflicted("aybz");

        workflow.cancel().unwrap();
        assert_eq!(workflow.state(), &WorkflowState::Cancelled);
        assert_eq!(session.content(), "aybz");
        assert!(session.has_pending());
    }

    #[test]
    fn invalid_transitions() {
        let mut session = ClientSyncSession::new("doc", "", 0);
        let mut workflow = ConflictResolutionWorkflow::new();

        assert!(matches!(
            workflow.resolve(ConflictResolution::KeepLocal, &mut session),
            Err(SyncError::InvalidStateTransition { .. })
        ));
        assert!(workflow.cancel().is_err());

        let mut workflow = conflicted("x");
        assert!(workflow
            .enter("y", VersionConflict::new(7, "z", None))
            .is_err());

        workflow.cancel().unwrap();
        assert!(workflow.cancel().is_err());

        // A settled workflow can be entered again.
        workflow
            .enter("y", VersionConflict::new(7, "z", None))
            .unwrap();
        assert!(workflow.is_conflicted());
    }
}
