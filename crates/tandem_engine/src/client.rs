//! Submission, catch-up and resync driver.

use crate::config::SessionConfig;
use crate::error::{SyncError, SyncResult};
use crate::session::{ClientSyncSession, RemoteOutcome};
use crate::transport::CollabTransport;
use crate::workflow::ConflictResolutionWorkflow;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tandem_protocol::{
    ConflictResolution, Delta, DocumentEvent, HistoryRequest, SnapshotRequest, SubmitRequest,
    SubmitResponse, VersionConflict,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, trace, warn};

/// The current state of a document client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Opened, nothing exchanged since.
    Idle,
    /// A submit is in flight.
    Submitting,
    /// Pulling missed history.
    CatchingUp,
    /// Rebuilding the session from a snapshot.
    Resyncing,
    /// Waiting for the user to resolve a conflict.
    Conflicted,
    /// Up to date with everything the client knows about.
    Synced,
    /// A request failed; the session may be out of step with the server
    /// until [`DocumentClient::reconnect`] runs.
    Error,
}

impl ClientState {
    /// Returns true while a request is being processed.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ClientState::Submitting | ClientState::CatchingUp | ClientState::Resyncing
        )
    }

    /// Returns true if pending edits can be submitted.
    pub fn can_submit(&self) -> bool {
        matches!(self, ClientState::Idle | ClientState::Synced)
    }

    fn name(&self) -> &'static str {
        match self {
            ClientState::Idle => "idle",
            ClientState::Submitting => "submitting",
            ClientState::CatchingUp => "catching-up",
            ClientState::Resyncing => "resyncing",
            ClientState::Conflicted => "conflicted",
            ClientState::Synced => "synced",
            ClientState::Error => "error",
        }
    }
}

/// Statistics about a client's exchanges with the server.
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Submit requests sent.
    pub submissions: u64,
    /// Submissions accepted.
    pub accepted: u64,
    /// Submissions rejected with a version conflict.
    pub conflicts: u64,
    /// Remote deltas applied.
    pub remote_applied: u64,
    /// Deliveries of deltas the session had already seen.
    pub duplicates_ignored: u64,
    /// Full resyncs performed.
    pub resyncs: u64,
    /// Read retries.
    pub retries: u64,
    /// Last time the client was in step with the server.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Result of [`DocumentClient::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending.
    Idle,
    /// The pending edits were accepted at `version`.
    Accepted {
        /// Version of the new log entry.
        version: u64,
    },
    /// The server found the pending edits changed nothing.
    Unchanged,
    /// Reconciliation gave up; the conflict workflow is open.
    NeedsResolution,
}

/// Drives one [`ClientSyncSession`] against a server.
///
/// Local edits go through [`edit`](Self::edit) and are sent by
/// [`flush`](Self::flush). Broadcast events are fed in with
/// [`handle_event`](Self::handle_event) or pulled from an attached receiver
/// by [`drain_events`](Self::drain_events).
///
/// Submissions are never retried blindly. A conflict is reconciled by
/// pulling the missed history and resubmitting, up to
/// `max_resubmits` times per flush, after which the conflict workflow is
/// opened. A transport failure during a submit leaves the outcome unknown:
/// the client moves to [`ClientState::Error`], ignores broadcasts, and
/// [`reconnect`](Self::reconnect) rebuilds the session from a snapshot.
pub struct DocumentClient<T: CollabTransport> {
    config: SessionConfig,
    transport: Arc<T>,
    session: ClientSyncSession,
    workflow: ConflictResolutionWorkflow,
    events: Option<broadcast::Receiver<DocumentEvent>>,
    state: ClientState,
    stats: ClientStats,
}

impl<T: CollabTransport> DocumentClient<T> {
    /// Opens a document by fetching its snapshot.
    pub fn open(config: SessionConfig, transport: Arc<T>) -> SyncResult<Self> {
        let request = SnapshotRequest::new(config.document_id.clone(), config.author.clone());
        let mut client = Self {
            session: ClientSyncSession::new(config.document_id.clone(), "", 0),
            config,
            transport,
            workflow: ConflictResolutionWorkflow::new(),
            events: None,
            state: ClientState::Idle,
            stats: ClientStats::default(),
        };

        let snapshot = client.with_retry(|t| t.snapshot(&request))?;
        client.session = ClientSyncSession::from_snapshot(&snapshot);
        info!(
            document = %snapshot.document_id,
            author = %client.config.author,
            version = snapshot.version,
            "opened document"
        );
        Ok(client)
    }

    /// Attaches a broadcast receiver for `document-delta` events.
    pub fn attach_events(&mut self, events: broadcast::Receiver<DocumentEvent>) {
        self.events = Some(events);
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Gets the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Gets the session.
    pub fn session(&self) -> &ClientSyncSession {
        &self.session
    }

    /// Content as the user sees it.
    pub fn content(&self) -> &str {
        self.session.content()
    }

    /// Last server version reflected in the content.
    pub fn base_version(&self) -> u64 {
        self.session.base_version()
    }

    /// Gets the conflict workflow.
    pub fn workflow(&self) -> &ConflictResolutionWorkflow {
        &self.workflow
    }

    /// Gets the current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Gets the current stats.
    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Records a local edit turning the content into `new_content`.
    ///
    /// Rejected while a conflict waits for the user.
    pub fn edit(&mut self, new_content: &str) -> SyncResult<Delta> {
        if let Some(conflict) = self.workflow.conflict().filter(|_| self.workflow.is_conflicted()) {
            return Err(SyncError::UnresolvedConflict {
                current_version: conflict.current_version,
            });
        }
        Ok(self.session.local_edit(new_content))
    }

    /// Submits pending edits until they are accepted, found to be a no-op,
    /// or reconciliation gives up.
    pub fn flush(&mut self) -> SyncResult<FlushOutcome> {
        if self.workflow.is_conflicted() {
            return Ok(FlushOutcome::NeedsResolution);
        }
        if !self.state.can_submit() {
            return Err(SyncError::InvalidStateTransition {
                from: self.state.name().to_string(),
                to: ClientState::Submitting.name().to_string(),
            });
        }

        self.session.squash_pending();
        let mut conflicts = 0u32;

        loop {
            let Some(delta) = self.session.front_pending().cloned() else {
                self.mark_synced();
                return Ok(FlushOutcome::Idle);
            };

            self.state = ClientState::Submitting;
            self.stats.submissions += 1;
            let request = SubmitRequest::new(
                self.config.document_id.clone(),
                delta,
                self.session.base_version(),
                self.config.author.clone(),
            );
            let response = match self.transport.submit(&request) {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        document = %self.config.document_id,
                        expected = request.expected_version,
                        "submit outcome unknown"
                    );
                    return Err(self.fail(e));
                }
            };

            match response {
                SubmitResponse::Accepted(entry) => {
                    if let Err(e) = self.session.acknowledge(entry.version) {
                        return Err(self.fail(e));
                    }
                    self.session.trim_applied(self.config.applied_window);
                    self.stats.accepted += 1;
                    self.mark_synced();
                    return Ok(FlushOutcome::Accepted {
                        version: entry.version,
                    });
                }
                SubmitResponse::Unchanged { version } => {
                    trace!(document = %self.config.document_id, version, "server saw no change");
                    self.session.drop_front_pending();
                    self.mark_synced();
                    return Ok(FlushOutcome::Unchanged);
                }
                SubmitResponse::Conflict(conflict) => {
                    self.stats.conflicts += 1;
                    conflicts += 1;
                    debug!(
                        document = %self.config.document_id,
                        expected = request.expected_version,
                        current = conflict.current_version,
                        attempt = conflicts,
                        "submit conflicted"
                    );

                    if conflicts > self.config.max_resubmits {
                        warn!(
                            document = %self.config.document_id,
                            conflicts,
                            "giving up on automatic reconciliation"
                        );
                        self.open_workflow(conflict)?;
                        return Ok(FlushOutcome::NeedsResolution);
                    }

                    self.reconcile(&conflict)?;
                    if self.state == ClientState::Conflicted {
                        return Ok(FlushOutcome::NeedsResolution);
                    }
                }
            }
        }
    }

    /// Applies one broadcast event.
    ///
    /// Duplicates are ignored. A version gap triggers a full resync. While
    /// the client is in the error state events are skipped: the session
    /// cannot tell its own unacknowledged delta from a remote one.
    pub fn handle_event(&mut self, event: &DocumentEvent) -> SyncResult<()> {
        if event.document_id() != self.config.document_id {
            return Err(SyncError::Protocol(format!(
                "event for document {} delivered to {}",
                event.document_id(),
                self.config.document_id
            )));
        }
        if self.state == ClientState::Error {
            trace!(document = %self.config.document_id, "skipped event while in error state");
            return Ok(());
        }

        let DocumentEvent::DeltaApplied { delta, .. } = event;
        match self.session.receive(delta) {
            Ok(RemoteOutcome::Applied) => {
                self.stats.remote_applied += 1;
                self.session.trim_applied(self.config.applied_window);
                Ok(())
            }
            Ok(RemoteOutcome::Duplicate) => {
                self.stats.duplicates_ignored += 1;
                Ok(())
            }
            Err(e) if e.requires_resync() => {
                warn!(document = %self.config.document_id, error = %e, "resyncing after gap");
                self.resync()
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Handles every event waiting on the attached receiver.
    ///
    /// A lagged receiver lost events, so missed history is pulled first.
    /// Returns the number of events handled.
    pub fn drain_events(&mut self) -> SyncResult<usize> {
        let Some(receiver) = self.events.as_mut() else {
            return Ok(0);
        };

        let mut events = Vec::new();
        let mut lagged = false;
        let mut closed = false;
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(document = %self.config.document_id, missed, "event receiver lagged");
                    lagged = true;
                }
                Err(TryRecvError::Closed) => {
                    closed = true;
                    break;
                }
            }
        }

        if lagged && self.state != ClientState::Error {
            self.catch_up()?;
        }
        for event in &events {
            self.handle_event(event)?;
        }
        if closed {
            self.events = None;
            return Err(SyncError::NotConnected);
        }
        Ok(events.len())
    }

    /// Pulls and applies every log entry after the session's version.
    ///
    /// Returns the number of entries applied.
    pub fn catch_up(&mut self) -> SyncResult<usize> {
        self.state = ClientState::CatchingUp;
        let mut applied = 0;

        loop {
            let since = self.session.base_version();
            let request = HistoryRequest::new(
                self.config.document_id.clone(),
                self.config.author.clone(),
                since,
                self.config.history_batch_size,
            );
            let history = self.with_retry(|t| t.history(&request))?;

            for entry in &history.deltas {
                match self.session.receive(entry) {
                    Ok(RemoteOutcome::Applied) => {
                        applied += 1;
                        self.stats.remote_applied += 1;
                    }
                    Ok(RemoteOutcome::Duplicate) => self.stats.duplicates_ignored += 1,
                    Err(e) if e.requires_resync() => {
                        warn!(document = %self.config.document_id, error = %e, "history out of order");
                        self.resync()?;
                        return Ok(applied);
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }

            // A page that ends at or below `since` moved nothing forward.
            let progressed = history.last_version().is_some_and(|last| last > since);
            if !history.has_more || !progressed {
                break;
            }
        }

        self.session.trim_applied(self.config.applied_window);
        debug!(
            document = %self.config.document_id,
            applied,
            version = self.session.base_version(),
            "caught up"
        );
        self.mark_synced();
        Ok(applied)
    }

    /// Rebuilds the session from a fresh snapshot.
    ///
    /// Pending edits cannot be trusted across a resync and are discarded.
    /// If that loses local content, the conflict workflow is opened with it
    /// so the user can still keep it.
    pub fn resync(&mut self) -> SyncResult<()> {
        self.state = ClientState::Resyncing;
        self.stats.resyncs += 1;

        let request = SnapshotRequest::new(self.config.document_id.clone(), self.config.author.clone());
        let snapshot = self.with_retry(|t| t.snapshot(&request))?;

        let local = self.session.content().to_string();
        let discarded = self
            .session
            .reset(snapshot.content.clone(), snapshot.version);
        info!(
            document = %self.config.document_id,
            version = snapshot.version,
            discarded = discarded.len(),
            "resynced"
        );

        if !discarded.is_empty() && local != snapshot.content && !self.workflow.is_conflicted() {
            let conflict = VersionConflict::new(
                snapshot.version,
                snapshot.content,
                snapshot.last_edited_by,
            );
            self.workflow.enter(local, conflict)?;
            self.state = ClientState::Conflicted;
        } else if self.workflow.is_conflicted() {
            self.state = ClientState::Conflicted;
        } else {
            self.mark_synced();
        }
        Ok(())
    }

    /// Re-establishes the transport and resyncs.
    pub fn reconnect(&mut self) -> SyncResult<()> {
        if let Err(e) = self.transport.reconnect() {
            return Err(self.fail(e));
        }
        info!(document = %self.config.document_id, "reconnected");
        self.resync()
    }

    /// Applies the user's choice for the open conflict and submits the
    /// result.
    pub fn resolve_conflict(&mut self, resolution: ConflictResolution) -> SyncResult<FlushOutcome> {
        self.workflow.resolve(resolution, &mut self.session)?;
        self.state = ClientState::Synced;
        self.catch_up()?;
        if self.state == ClientState::Conflicted {
            return Ok(FlushOutcome::NeedsResolution);
        }
        self.flush()
    }

    /// Dismisses the open conflict, keeping local state as it is.
    pub fn cancel_conflict(&mut self) -> SyncResult<()> {
        self.workflow.cancel()?;
        self.state = ClientState::Synced;
        Ok(())
    }

    /// Closes the client. Unacknowledged edits are dropped.
    pub fn close(mut self) -> SyncResult<()> {
        if self.session.has_pending() {
            debug!(
                document = %self.config.document_id,
                pending = self.session.pending_count(),
                "closing with unacknowledged edits"
            );
        }
        self.events = None;
        self.state = ClientState::Idle;
        self.transport.close()
    }

    /// Brings pending edits in line with the server state named by a
    /// conflict, ready for another submit.
    fn reconcile(&mut self, conflict: &VersionConflict) -> SyncResult<()> {
        self.catch_up()?;
        if self.state == ClientState::Conflicted {
            return Ok(());
        }
        if self.session.base_version() == conflict.current_version {
            self.session.rediff_pending(&conflict.current_content);
        }
        self.session.squash_pending();
        Ok(())
    }

    fn open_workflow(&mut self, conflict: VersionConflict) -> SyncResult<()> {
        self.workflow
            .enter(self.session.content().to_string(), conflict)?;
        self.state = ClientState::Conflicted;
        Ok(())
    }

    fn mark_synced(&mut self) {
        self.state = ClientState::Synced;
        self.stats.last_sync_time = Some(Instant::now());
    }

    fn fail(&mut self, error: SyncError) -> SyncError {
        warn!(document = %self.config.document_id, error = %error, "sync failed");
        self.state = ClientState::Error;
        self.stats.last_error = Some(error.to_string());
        error
    }

    /// Runs an idempotent read with backoff.
    fn with_retry<R>(&mut self, op: impl Fn(&T) -> SyncResult<R>) -> SyncResult<R> {
        let transport = Arc::clone(&self.transport);
        let retry = self.config.retry.clone();
        let mut attempt = 0u32;

        loop {
            match op(transport.as_ref()) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                    attempt += 1;
                    self.stats.retries += 1;
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(attempt, ?delay, error = %e, "retrying request");
                    thread::sleep(delay);
                    if !transport.is_connected() {
                        if let Err(e) = transport.reconnect() {
                            debug!(error = %e, "reconnect before retry failed");
                        }
                    }
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::transport::MockTransport;
    use crate::workflow::WorkflowState;
    use tandem_protocol::{create_delta, DocumentSnapshot, HistoryResponse, VersionedDelta};

    fn snapshot(content: &str, version: u64) -> DocumentSnapshot {
        DocumentSnapshot {
            document_id: "doc".into(),
            title: "Notes".into(),
            owner: "alice".into(),
            content: content.into(),
            version,
            collaborators: vec!["alice".into(), "bob".into()],
            last_edited_by: None,
        }
    }

    fn open(content: &str, version: u64) -> (DocumentClient<MockTransport>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        transport.set_snapshot_response(snapshot(content, version));
        let config = SessionConfig::new("doc", "bob").with_retry(RetryConfig::no_retry());
        let client = DocumentClient::open(config, Arc::clone(&transport)).unwrap();
        (client, transport)
    }

    fn entry(old: &str, new: &str, version: u64) -> VersionedDelta {
        VersionedDelta::new(create_delta(old, new), "alice", 0, version)
    }

    #[test]
    fn state_predicates() {
        assert!(ClientState::Submitting.is_active());
        assert!(!ClientState::Synced.is_active());
        assert!(ClientState::Idle.can_submit());
        assert!(!ClientState::Error.can_submit());
        assert!(!ClientState::Conflicted.can_submit());
    }

    #[test]
    fn open_uses_snapshot() {
        let (client, _) = open("ab", 5);
        assert_eq!(client.content(), "ab");
        assert_eq!(client.base_version(), 5);
        assert_eq!(client.state(), ClientState::Idle);
    }

    #[test]
    fn flush_with_nothing_pending() {
        let (mut client, transport) = open("ab", 5);
        assert_eq!(client.flush().unwrap(), FlushOutcome::Idle);
        assert!(transport.submitted().is_empty());
    }

    #[test]
    fn accepted_flush_acknowledges() {
        let (mut client, transport) = open("ab", 5);
        client.edit("abc").unwrap();
        transport.push_submit_response(SubmitResponse::Accepted(entry("ab", "abc", 6)));

        assert_eq!(client.flush().unwrap(), FlushOutcome::Accepted { version: 6 });
        assert_eq!(client.base_version(), 6);
        assert!(!client.session().has_pending());
        assert_eq!(client.stats().accepted, 1);
        assert_eq!(transport.submitted()[0].expected_version, 5);
    }

    #[test]
    fn pending_edits_are_sent_as_one_delta() {
        let (mut client, transport) = open("ab", 0);
        client.edit("abc").unwrap();
        client.edit("abcd").unwrap();
        transport.push_submit_response(SubmitResponse::Accepted(entry("ab", "abcd", 1)));

        client.flush().unwrap();
        let submitted = transport.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].delta.apply("ab"), "abcd");
    }

    #[test]
    fn unchanged_drops_pending() {
        let (mut client, transport) = open("ab", 0);
        client.edit("abc").unwrap();
        transport.push_submit_response(SubmitResponse::Unchanged { version: 0 });

        assert_eq!(client.flush().unwrap(), FlushOutcome::Unchanged);
        assert!(!client.session().has_pending());
    }

    #[test]
    fn conflict_is_reconciled_and_resubmitted() {
        let (mut client, transport) = open("ab", 5);
        client.edit("ayb").unwrap();

        transport.push_submit_response(SubmitResponse::Conflict(VersionConflict::new(
            6,
            "axb",
            Some("alice".into()),
        )));
        transport.set_history_response(HistoryResponse::new(vec![entry("ab", "axb", 6)], 6, false));
        transport.push_submit_response(SubmitResponse::Accepted(VersionedDelta::new(
            create_delta("axb", "axyb"),
            "bob",
            0,
            7,
        )));

        assert_eq!(client.flush().unwrap(), FlushOutcome::Accepted { version: 7 });
        assert_eq!(client.content(), "axyb");

        let submitted = transport.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[1].expected_version, 6);
        assert_eq!(submitted[1].delta, create_delta("axb", "axyb"));
        assert_eq!(client.stats().conflicts, 1);
    }

    #[test]
    fn repeated_conflicts_open_the_workflow() {
        let (mut client, transport) = open("ab", 5);
        client.edit("ayb").unwrap();

        // History never catches the client up, so every resubmit conflicts.
        transport.set_history_response(HistoryResponse::new(Vec::new(), 9, false));
        for _ in 0..4 {
            transport.push_submit_response(SubmitResponse::Conflict(VersionConflict::new(
                9, "zzz", None,
            )));
        }

        assert_eq!(client.flush().unwrap(), FlushOutcome::NeedsResolution);
        assert_eq!(client.state(), ClientState::Conflicted);
        assert_eq!(transport.submitted().len(), 4);
        assert_eq!(client.workflow().local_content(), Some("ayb"));
        assert!(matches!(
            client.edit("aybb"),
            Err(SyncError::UnresolvedConflict { current_version: 9 })
        ));
        assert_eq!(client.flush().unwrap(), FlushOutcome::NeedsResolution);
    }

    #[test]
    fn cancel_conflict_keeps_local_edits() {
        let (mut client, transport) = open("ab", 5);
        client.edit("ayb").unwrap();
        transport.set_history_response(HistoryResponse::new(Vec::new(), 9, false));
        transport.push_submit_response(SubmitResponse::Conflict(VersionConflict::new(9, "zzz", None)));

        let config = client.config().clone().with_max_resubmits(0);
        client.config = config;
        assert_eq!(client.flush().unwrap(), FlushOutcome::NeedsResolution);

        client.cancel_conflict().unwrap();
        assert_eq!(client.workflow().state(), &WorkflowState::Cancelled);
        assert_eq!(client.content(), "ayb");
        assert!(client.session().has_pending());
        assert_eq!(client.state(), ClientState::Synced);
    }

    #[test]
    fn transport_failure_during_submit_needs_reconnect() {
        let (mut client, transport) = open("ab", 5);
        client.edit("abc").unwrap();
        transport.fail_next_submit();

        assert!(client.flush().is_err());
        assert_eq!(client.state(), ClientState::Error);
        assert!(client.stats().last_error.is_some());

        // Not retried.
        assert_eq!(transport.submitted().len(), 1);
        assert!(matches!(
            client.flush(),
            Err(SyncError::InvalidStateTransition { .. })
        ));

        // Events are ignored until the session is rebuilt.
        let event = DocumentEvent::DeltaApplied {
            document_id: "doc".into(),
            delta: entry("ab", "abc", 6),
        };
        client.handle_event(&event).unwrap();
        assert_eq!(client.base_version(), 5);

        // The submit had in fact been accepted.
        transport.set_snapshot_response(snapshot("abc", 6));
        client.reconnect().unwrap();
        assert_eq!(client.state(), ClientState::Synced);
        assert_eq!(client.content(), "abc");
        assert_eq!(client.base_version(), 6);
        assert!(!client.workflow().is_conflicted());
    }

    #[test]
    fn resync_rescues_lost_local_edits() {
        let (mut client, transport) = open("ab", 5);
        client.edit("ab!").unwrap();
        transport.set_snapshot_response(snapshot("xab", 7));

        client.resync().unwrap();
        assert_eq!(client.state(), ClientState::Conflicted);
        assert_eq!(client.workflow().local_content(), Some("ab!"));
        assert_eq!(client.content(), "xab");
    }

    #[test]
    fn events_apply_in_order_and_gaps_resync() {
        let (mut client, transport) = open("ab", 5);
        let event = |old: &str, new: &str, version| DocumentEvent::DeltaApplied {
            document_id: "doc".into(),
            delta: entry(old, new, version),
        };

        client.handle_event(&event("ab", "abc", 6)).unwrap();
        client.handle_event(&event("ab", "abc", 6)).unwrap();
        assert_eq!(client.content(), "abc");
        assert_eq!(client.stats().remote_applied, 1);
        assert_eq!(client.stats().duplicates_ignored, 1);

        transport.set_snapshot_response(snapshot("abcde", 8));
        client.handle_event(&event("abcd", "abcde", 8)).unwrap();
        assert_eq!(client.content(), "abcde");
        assert_eq!(client.base_version(), 8);
        assert_eq!(client.stats().resyncs, 1);
    }

    #[test]
    fn events_for_other_documents_are_rejected() {
        let (mut client, _) = open("ab", 5);
        let event = DocumentEvent::DeltaApplied {
            document_id: "other".into(),
            delta: entry("ab", "abc", 6),
        };
        assert!(matches!(client.handle_event(&event), Err(SyncError::Protocol(_))));
    }

    #[test]
    fn drain_events_from_receiver() {
        let (mut client, _) = open("ab", 5);
        let (sender, receiver) = broadcast::channel(8);
        client.attach_events(receiver);

        sender
            .send(DocumentEvent::DeltaApplied {
                document_id: "doc".into(),
                delta: entry("ab", "abc", 6),
            })
            .unwrap();
        assert_eq!(client.drain_events().unwrap(), 1);
        assert_eq!(client.content(), "abc");

        drop(sender);
        assert!(matches!(client.drain_events(), Err(SyncError::NotConnected)));
        assert_eq!(client.drain_events().unwrap(), 0);
    }

    #[test]
    fn catch_up_stops_when_paging_makes_no_progress() {
        let (mut client, transport) = open("ab", 5);
        // Claims more pages but keeps serving the same one.
        transport.set_history_response(HistoryResponse::new(vec![entry("ab", "abc", 6)], 9, true));

        assert_eq!(client.catch_up().unwrap(), 1);
        assert_eq!(client.base_version(), 6);
        assert_eq!(client.stats().duplicates_ignored, 1);
        assert_eq!(client.state(), ClientState::Synced);
    }

    #[test]
    fn lagged_receiver_catches_up() {
        let (mut client, transport) = open("", 0);
        let (sender, receiver) = broadcast::channel(1);
        client.attach_events(receiver);

        sender
            .send(DocumentEvent::DeltaApplied {
                document_id: "doc".into(),
                delta: entry("", "a", 1),
            })
            .unwrap();
        sender
            .send(DocumentEvent::DeltaApplied {
                document_id: "doc".into(),
                delta: entry("a", "ab", 2),
            })
            .unwrap();
        transport.set_history_response(HistoryResponse::new(
            vec![entry("", "a", 1), entry("a", "ab", 2)],
            2,
            false,
        ));

        client.drain_events().unwrap();
        assert_eq!(client.content(), "ab");
        assert_eq!(client.base_version(), 2);
    }
}
