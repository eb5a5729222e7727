//! Per-document client session state.

use crate::error::{SyncError, SyncResult};
use std::collections::VecDeque;
use tandem_protocol::{create_delta, transform, Delta, DocumentId, DocumentSnapshot, VersionedDelta};
use tracing::{debug, trace};

/// What happened to a delivered log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The entry was transformed and applied.
    Applied,
    /// The entry was already reflected in the session and was ignored.
    Duplicate,
}

/// One client's view of one document.
///
/// The session tracks three things:
/// - `base_version`: the last server version reflected in the content
/// - `content`: server content at `base_version` with every pending local
///   delta applied on top, which is what the user sees
/// - `pending`: local deltas not yet acknowledged by the server, in order;
///   the first one applies to server content at `base_version`
///
/// It also keeps a window of the server deltas it has applied (in log
/// coordinates) so that a remote delta built against an older version can
/// be rebased before it is applied.
///
/// Sessions are plain values mutated through `&mut self`; exactly one
/// writer drives a session.
#[derive(Debug, Clone)]
pub struct ClientSyncSession {
    document_id: DocumentId,
    base_version: u64,
    content: String,
    /// Version `applied[0]` was built against.
    history_start: u64,
    applied: Vec<Delta>,
    pending: VecDeque<Delta>,
}

impl ClientSyncSession {
    /// Opens a session at a known server state.
    pub fn new(document_id: impl Into<DocumentId>, content: impl Into<String>, version: u64) -> Self {
        Self {
            document_id: document_id.into(),
            base_version: version,
            content: content.into(),
            history_start: version,
            applied: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Opens a session from a server snapshot.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        Self::new(
            snapshot.document_id.clone(),
            snapshot.content.clone(),
            snapshot.version,
        )
    }

    /// Rebuilds a session by replaying a log from version 0.
    ///
    /// Entries must be numbered 1, 2, 3... without gaps.
    pub fn from_history(
        document_id: impl Into<DocumentId>,
        base_content: impl Into<String>,
        entries: &[VersionedDelta],
    ) -> SyncResult<Self> {
        let mut session = Self::new(document_id, base_content, 0);
        for entry in entries {
            if session.receive(entry)? == RemoteOutcome::Duplicate {
                return Err(SyncError::OutOfOrderDelta {
                    expected: session.base_version + 1,
                    received: entry.version,
                });
            }
        }
        Ok(session)
    }

    /// Document ID.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Last server version reflected in the content.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Content as the user sees it.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Unacknowledged local deltas, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Delta> {
        self.pending.iter()
    }

    /// Number of unacknowledged local deltas.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if there are unacknowledged local deltas.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Oldest unacknowledged delta.
    pub fn front_pending(&self) -> Option<&Delta> {
        self.pending.front()
    }

    /// Server deltas kept for rebasing, with the version the first one
    /// was built against.
    pub fn applied(&self) -> (u64, &[Delta]) {
        (self.history_start, &self.applied)
    }

    /// Records a local edit that turned the content into `new_content`.
    ///
    /// The content updates immediately. The returned delta is queued as
    /// pending unless it is empty.
    pub fn local_edit(&mut self, new_content: &str) -> Delta {
        let delta = create_delta(&self.content, new_content);
        if !delta.is_empty() {
            trace!(document = %self.document_id, ops = delta.len(), "queued local edit");
            self.pending.push_back(delta.clone());
            self.content = new_content.to_string();
        }
        delta
    }

    /// Applies a remote delta built against `remote_base`.
    ///
    /// A delta built against an older version is first rebased over the
    /// server deltas applied since then, in log order. The result is then
    /// transformed past every pending local delta (which are rebased in
    /// turn) and applied. The server sequenced the remote delta first, so
    /// its inserts win ties against pending edits.
    ///
    /// A remote base above `base_version`, or older than the kept window,
    /// is an [`SyncError::OutOfOrderDelta`]: the session cannot repair it.
    pub fn receive_remote(&mut self, delta: &Delta, remote_base: u64, author: &str) -> SyncResult<()> {
        if remote_base > self.base_version || remote_base < self.history_start {
            debug!(
                document = %self.document_id,
                base = self.base_version,
                remote_base,
                "remote delta out of order"
            );
            return Err(SyncError::OutOfOrderDelta {
                expected: self.base_version + 1,
                received: remote_base + 1,
            });
        }

        let skip = usize::try_from(remote_base - self.history_start).unwrap_or(usize::MAX);
        let earlier = self.applied.get(skip..).ok_or_else(|| {
            SyncError::Protocol(format!("remote base {remote_base} out of range"))
        })?;
        let rebased = earlier
            .iter()
            .fold(delta.clone(), |remote, applied| transform(applied, &remote).1);

        let mut visible = rebased.clone();
        for pending in self.pending.iter_mut() {
            let (remote_prime, pending_prime) = transform(&visible, pending);
            visible = remote_prime;
            *pending = pending_prime;
        }

        self.content = visible.apply(&self.content);
        self.applied.push(rebased);
        self.base_version += 1;

        debug!(
            document = %self.document_id,
            author,
            version = self.base_version,
            rebased_over = self.applied.len().saturating_sub(skip + 1),
            pending = self.pending.len(),
            "applied remote delta"
        );
        Ok(())
    }

    /// Applies a log entry delivered by the server.
    ///
    /// Entries at or below `base_version` were already seen (delivery is
    /// at-least-once, and a session's own accepted deltas come back too) and
    /// are ignored. Anything but the next version is out of order.
    pub fn receive(&mut self, entry: &VersionedDelta) -> SyncResult<RemoteOutcome> {
        if entry.version <= self.base_version {
            trace!(document = %self.document_id, version = entry.version, "ignored duplicate delta");
            return Ok(RemoteOutcome::Duplicate);
        }
        if entry.version != self.base_version + 1 {
            debug!(
                document = %self.document_id,
                expected = self.base_version + 1,
                received = entry.version,
                "version gap"
            );
            return Err(SyncError::OutOfOrderDelta {
                expected: self.base_version + 1,
                received: entry.version,
            });
        }
        self.receive_remote(&entry.operations, entry.base_version(), &entry.author)?;
        Ok(RemoteOutcome::Applied)
    }

    /// Marks the oldest pending delta as accepted at `version`.
    pub fn acknowledge(&mut self, version: u64) -> SyncResult<()> {
        if version != self.base_version + 1 {
            return Err(SyncError::OutOfOrderDelta {
                expected: self.base_version + 1,
                received: version,
            });
        }
        let delta = self.pending.pop_front().ok_or_else(|| {
            SyncError::Protocol(format!("acknowledgement for version {version} without a pending delta"))
        })?;
        self.applied.push(delta);
        self.base_version = version;
        debug!(document = %self.document_id, version, "local delta acknowledged");
        Ok(())
    }

    /// Composes all pending deltas into one.
    ///
    /// A composition that changes nothing leaves no pending delta.
    pub fn squash_pending(&mut self) {
        if self.pending.len() < 2 {
            if self.pending.front().is_some_and(Delta::is_identity) {
                self.pending.clear();
            }
            return;
        }
        let combined = self
            .pending
            .drain(..)
            .reduce(|first, second| first.compose(&second))
            .unwrap_or_default();
        if !combined.is_identity() {
            self.pending.push_back(combined);
        }
    }

    /// Replaces pending deltas with one diff from `server_content`, which
    /// must be the server content at `base_version`.
    pub fn rediff_pending(&mut self, server_content: &str) {
        self.pending.clear();
        let delta = create_delta(server_content, &self.content);
        if !delta.is_empty() {
            self.pending.push_back(delta);
        }
    }

    /// Drops the oldest pending delta, which the server found to be a no-op.
    pub fn drop_front_pending(&mut self) -> Option<Delta> {
        self.pending.pop_front()
    }

    /// Resets the session to a server state, returning the discarded
    /// pending deltas.
    pub fn reset(&mut self, content: impl Into<String>, version: u64) -> Vec<Delta> {
        self.content = content.into();
        self.base_version = version;
        self.history_start = version;
        self.applied.clear();
        self.pending.drain(..).collect()
    }

    /// Keeps at most `keep` applied deltas for rebasing.
    pub fn trim_applied(&mut self, keep: usize) {
        if self.applied.len() > keep {
            let excess = self.applied.len() - keep;
            self.applied.drain(..excess);
            self.history_start += excess as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(delta: Delta, author: &str, version: u64) -> VersionedDelta {
        VersionedDelta::new(delta, author, 0, version)
    }

    #[test]
    fn local_edit_applies_immediately() {
        let mut session = ClientSyncSession::new("doc", "hello", 0);
        let delta = session.local_edit("hallo");

        assert_eq!(delta, Delta::new().retain(1).delete(1).insert("a").retain(3));
        assert_eq!(session.content(), "hallo");
        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.base_version(), 0);
    }

    #[test]
    fn unchanged_edit_is_not_queued() {
        let mut session = ClientSyncSession::new("doc", "hello", 0);
        assert!(session.local_edit("hello").is_empty());
        assert!(!session.has_pending());
    }

    #[test]
    fn remote_delta_is_transformed_past_pending() {
        let mut session = ClientSyncSession::new("doc", "ab", 5);
        session.local_edit("ayb");

        let remote = entry(create_delta("ab", "axb"), "alice", 6);
        assert_eq!(session.receive(&remote).unwrap(), RemoteOutcome::Applied);

        // Sequenced first, so the remote insert goes first.
        assert_eq!(session.content(), "axyb");
        assert_eq!(session.base_version(), 6);
        assert_eq!(
            session.front_pending().unwrap().apply("axb"),
            "axyb",
            "pending delta must now apply to the server content"
        );
    }

    #[test]
    fn stale_remote_is_rebased_over_applied_entries() {
        let v1 = create_delta("abc", "1abc");
        let v2 = create_delta("1abc", "1abc2");
        let v3 = create_delta("1abc2", "1ac2");
        let mut session = ClientSyncSession::from_history(
            "doc",
            "abc",
            &[entry(v1, "a", 1), entry(v2, "b", 2), entry(v3, "c", 3)],
        )
        .unwrap();
        assert_eq!(session.content(), "1ac2");
        assert_eq!(session.base_version(), 3);

        // Built against version 1.
        let remote = create_delta("1abc", "1Xabc");
        session.receive_remote(&remote, 1, "carol").unwrap();

        assert_eq!(session.content(), "1Xac2");
        assert_eq!(session.base_version(), 4);

        // The recorded delta replays cleanly from scratch.
        let (start, applied) = session.applied();
        assert_eq!(start, 0);
        let entries: Vec<_> = applied
            .iter()
            .enumerate()
            .map(|(i, d)| entry(d.clone(), "x", i as u64 + 1))
            .collect();
        let rebuilt = ClientSyncSession::from_history("doc", "abc", &entries).unwrap();
        assert_eq!(rebuilt.content(), session.content());
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut session = ClientSyncSession::new("doc", "ab", 2);
        let old = entry(create_delta("ab", "abc"), "alice", 2);
        assert_eq!(session.receive(&old).unwrap(), RemoteOutcome::Duplicate);
        assert_eq!(session.content(), "ab");
        assert_eq!(session.base_version(), 2);
    }

    #[test]
    fn version_gap_is_out_of_order() {
        let mut session = ClientSyncSession::new("doc", "ab", 2);
        let ahead = entry(create_delta("ab", "abc"), "alice", 4);
        let err = session.receive(&ahead).unwrap_err();
        assert!(matches!(
            err,
            SyncError::OutOfOrderDelta {
                expected: 3,
                received: 4
            }
        ));
        assert!(err.requires_resync());
        assert_eq!(session.content(), "ab");
    }

    #[test]
    fn remote_base_ahead_is_out_of_order() {
        let mut session = ClientSyncSession::new("doc", "ab", 2);
        let err = session
            .receive_remote(&Delta::new().insert("x"), 3, "alice")
            .unwrap_err();
        assert!(matches!(err, SyncError::OutOfOrderDelta { .. }));
    }

    #[test]
    fn remote_base_before_window_is_out_of_order() {
        let mut session = ClientSyncSession::new("doc", "", 0);
        for (i, text) in ["a", "ab", "abc"].iter().enumerate() {
            let prev = session.content().to_string();
            session
                .receive(&entry(create_delta(&prev, text), "alice", i as u64 + 1))
                .unwrap();
        }
        session.trim_applied(1);
        assert_eq!(session.applied().0, 2);

        assert!(session.receive_remote(&Delta::new().insert("z"), 1, "bob").is_err());
        session.receive_remote(&Delta::new().insert("z"), 2, "bob").unwrap();
        assert_eq!(session.content(), "zabc");
    }

    #[test]
    fn acknowledge_moves_pending_to_applied() {
        let mut session = ClientSyncSession::new("doc", "ab", 5);
        session.local_edit("abc");
        session.acknowledge(6).unwrap();

        assert_eq!(session.base_version(), 6);
        assert!(!session.has_pending());
        assert_eq!(session.applied().1.len(), 1);
    }

    #[test]
    fn acknowledge_requires_next_version_and_pending() {
        let mut session = ClientSyncSession::new("doc", "ab", 5);
        assert!(matches!(session.acknowledge(6), Err(SyncError::Protocol(_))));

        session.local_edit("abc");
        assert!(matches!(
            session.acknowledge(8),
            Err(SyncError::OutOfOrderDelta { .. })
        ));
        assert!(session.has_pending());
    }

    #[test]
    fn squash_composes_pending() {
        let mut session = ClientSyncSession::new("doc", "ab", 0);
        session.local_edit("abc");
        session.local_edit("xabc");
        session.squash_pending();

        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.front_pending().unwrap().apply("ab"), "xabc");
    }

    #[test]
    fn squash_drops_edits_that_cancel_out() {
        let mut session = ClientSyncSession::new("doc", "ab", 0);
        session.local_edit("abc");
        session.local_edit("ab");
        session.squash_pending();
        assert!(!session.has_pending());
    }

    #[test]
    fn rediff_matches_transformed_pending() {
        let mut session = ClientSyncSession::new("doc", "ab", 5);
        session.local_edit("ayb");
        session
            .receive(&entry(create_delta("ab", "axb"), "alice", 6))
            .unwrap();
        let transformed = session.front_pending().unwrap().clone();

        session.rediff_pending("axb");
        assert_eq!(session.front_pending().unwrap(), &transformed);
    }

    #[test]
    fn reset_discards_pending() {
        let mut session = ClientSyncSession::new("doc", "ab", 1);
        session.local_edit("abc");
        let dropped = session.reset("server", 9);

        assert_eq!(dropped.len(), 1);
        assert_eq!(session.content(), "server");
        assert_eq!(session.base_version(), 9);
        assert!(!session.has_pending());
        assert_eq!(session.applied(), (9, &[][..]));
    }

    #[test]
    fn history_with_gap_is_rejected() {
        let result = ClientSyncSession::from_history(
            "doc",
            "",
            &[entry(Delta::new().insert("a"), "a", 2)],
        );
        assert!(result.is_err());
    }
}
