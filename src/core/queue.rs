//! In-memory waitlist for QueueBot.
//!
//! The queue is an ordered, deduplicated sequence of participants:
//! - front (position 1) is the next person to be served
//! - back is the most recent joiner
//!
//! Every operation takes the same mutex, so a read never observes a
//! half-applied mutation and concurrent joins cannot lose updates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Transport-assigned user identifier (a Telegram chat id).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ParticipantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Someone waiting in line.
///
/// Equality is by `id` only; the label is whatever handle the transport
/// reported at join time and may be stale or missing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub label: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            label,
        }
    }

    /// Name to show in listings, falling back to the raw id.
    pub fn display_name(&self) -> String {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.id.to_string(),
        }
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Participant {}

/// Result of [`QueueStore::join`]. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Added(usize),
    AlreadyPresent(usize),
}

impl JoinOutcome {
    pub fn position(&self) -> usize {
        match self {
            JoinOutcome::Added(pos) | JoinOutcome::AlreadyPresent(pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Removed,
    NotFound,
}

/// Result of a bump. The participant always lands at position 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpOutcome {
    Moved { participant: Participant, from: usize },
    NotFound,
}

/// Result of serving the front of the line. `remaining` is read under the
/// same lock as the removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    Popped {
        participant: Participant,
        remaining: usize,
    },
    Empty,
}

/// The single process-wide waitlist.
#[derive(Debug, Default)]
pub struct QueueStore {
    entries: Mutex<Vec<Participant>>,
}

impl QueueStore {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Participant>> {
        // Every mutation below completes before the guard drops, so a
        // poisoned lock still holds a consistent sequence.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a participant unless already present.
    pub fn join(&self, id: ParticipantId, label: Option<String>) -> JoinOutcome {
        let mut entries = self.lock();

        if let Some(idx) = entries.iter().position(|p| p.id == id) {
            return JoinOutcome::AlreadyPresent(idx + 1);
        }

        entries.push(Participant { id, label });
        tracing::debug!("Participant {} joined at position {}", id, entries.len());
        JoinOutcome::Added(entries.len())
    }

    /// Remove a participant wherever they are in line.
    pub fn leave(&self, id: ParticipantId) -> LeaveOutcome {
        let mut entries = self.lock();

        match entries.iter().position(|p| p.id == id) {
            Some(idx) => {
                entries.remove(idx);
                tracing::debug!("Participant {} left from position {}", id, idx + 1);
                LeaveOutcome::Removed
            }
            None => LeaveOutcome::NotFound,
        }
    }

    /// Move a participant to the front.
    pub fn bump(&self, id: ParticipantId) -> BumpOutcome {
        self.bump_where(|_, p| p.id == id)
    }

    /// Move the first participant matching `pred` to the front.
    ///
    /// `pred` receives the 1-based position and the participant. Lookup and
    /// relocation happen under one lock acquisition.
    pub fn bump_where<F>(&self, pred: F) -> BumpOutcome
    where
        F: Fn(usize, &Participant) -> bool,
    {
        let mut entries = self.lock();

        let Some(idx) = entries
            .iter()
            .enumerate()
            .position(|(idx, p)| pred(idx + 1, p))
        else {
            return BumpOutcome::NotFound;
        };

        // Rotating the prefix shifts everyone ahead back by one and keeps
        // the rest untouched.
        entries[..=idx].rotate_right(1);
        let participant = entries[0].clone();
        tracing::debug!(
            "Participant {} bumped from position {} to 1",
            participant.id,
            idx + 1
        );

        BumpOutcome::Moved {
            participant,
            from: idx + 1,
        }
    }

    /// Remove and return the participant at the front.
    pub fn pop_front(&self) -> PopOutcome {
        let mut entries = self.lock();

        if entries.is_empty() {
            return PopOutcome::Empty;
        }

        let participant = entries.remove(0);
        PopOutcome::Popped {
            participant,
            remaining: entries.len(),
        }
    }

    /// Empty the queue, returning how many participants were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Consistent copy of the whole line, front first.
    pub fn snapshot(&self) -> Vec<Participant> {
        self.lock().clone()
    }

    /// 1-based position of `id`, if queued.
    pub fn position_of(&self, id: ParticipantId) -> Option<usize> {
        self.lock().iter().position(|p| p.id == id).map(|idx| idx + 1)
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ids(store: &QueueStore) -> Vec<i64> {
        store.snapshot().iter().map(|p| p.id.0).collect()
    }

    fn filled(n: i64) -> QueueStore {
        let store = QueueStore::new();
        for id in 1..=n {
            store.join(ParticipantId(id), Some(format!("user{}", id)));
        }
        store
    }

    #[test]
    fn test_join_is_fifo() {
        let store = QueueStore::new();
        assert_eq!(store.join(ParticipantId(30), None), JoinOutcome::Added(1));
        assert_eq!(store.join(ParticipantId(10), None), JoinOutcome::Added(2));
        assert_eq!(store.join(ParticipantId(20), None), JoinOutcome::Added(3));

        assert_eq!(ids(&store), vec![30, 10, 20]);
    }

    #[test]
    fn test_join_is_idempotent() {
        let store = filled(2);
        let first = store.join(ParticipantId(7), Some("alice".into()));
        let second = store.join(ParticipantId(7), Some("alice_renamed".into()));

        assert_eq!(first, JoinOutcome::Added(3));
        assert_eq!(second, JoinOutcome::AlreadyPresent(3));
        assert_eq!(first.position(), second.position());
        assert_eq!(store.size(), 3);
        // Label from the first join is kept.
        assert_eq!(store.snapshot()[2].label.as_deref(), Some("alice"));
    }

    #[test]
    fn test_leave_shifts_followers_forward() {
        let store = filled(4);
        assert_eq!(store.leave(ParticipantId(2)), LeaveOutcome::Removed);

        assert_eq!(ids(&store), vec![1, 3, 4]);
        assert_eq!(store.position_of(ParticipantId(2)), None);
        assert_eq!(store.position_of(ParticipantId(3)), Some(2));
    }

    #[test]
    fn test_leave_absent_is_noop() {
        let store = filled(3);
        assert_eq!(store.leave(ParticipantId(99)), LeaveOutcome::NotFound);
        assert_eq!(store.size(), 3);
    }

    #[test]
    fn test_bump_moves_to_front_and_keeps_relative_order() {
        let store = filled(5);
        let outcome = store.bump(ParticipantId(4));

        match outcome {
            BumpOutcome::Moved { participant, from } => {
                assert_eq!(participant.id, ParticipantId(4));
                assert_eq!(participant.label.as_deref(), Some("user4"));
                assert_eq!(from, 4);
            }
            BumpOutcome::NotFound => panic!("expected a move"),
        }

        assert_eq!(store.position_of(ParticipantId(4)), Some(1));
        assert_eq!(ids(&store), vec![4, 1, 2, 3, 5]);
    }

    #[test]
    fn test_bump_front_and_absent() {
        let store = filled(3);
        assert!(matches!(
            store.bump(ParticipantId(1)),
            BumpOutcome::Moved { from: 1, .. }
        ));
        assert_eq!(ids(&store), vec![1, 2, 3]);

        assert_eq!(store.bump(ParticipantId(42)), BumpOutcome::NotFound);
        assert_eq!(ids(&store), vec![1, 2, 3]);
    }

    #[test]
    fn test_bump_where_by_position() {
        let store = filled(3);
        let outcome = store.bump_where(|pos, _| pos == 3);

        assert!(matches!(outcome, BumpOutcome::Moved { from: 3, .. }));
        assert_eq!(ids(&store), vec![3, 1, 2]);
    }

    #[test]
    fn test_pop_front() {
        let store = QueueStore::new();
        assert_eq!(store.pop_front(), PopOutcome::Empty);
        assert_eq!(store.size(), 0);

        store.join(ParticipantId(1), None);
        store.join(ParticipantId(2), None);

        assert_eq!(
            store.pop_front(),
            PopOutcome::Popped {
                participant: Participant::new(ParticipantId(1), None),
                remaining: 1,
            }
        );
        assert_eq!(store.size(), 1);
        assert_eq!(store.position_of(ParticipantId(2)), Some(1));
    }

    #[test]
    fn test_pop_front_remaining_matches_concurrent_joins() {
        let store = Arc::new(QueueStore::new());
        for i in 0..100 {
            store.join(ParticipantId(i), None);
        }

        let joiner = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 1000..1100 {
                    store.join(ParticipantId(i), None);
                }
            })
        };

        let mut served = 0;
        while let PopOutcome::Popped { remaining, .. } = store.pop_front() {
            served += 1;
            assert!(remaining <= 200 - served);
            if served == 50 {
                break;
            }
        }
        joiner.join().unwrap();

        match store.pop_front() {
            PopOutcome::Popped { remaining, .. } => assert_eq!(remaining, store.size()),
            PopOutcome::Empty => panic!("queue drained early"),
        }
    }

    #[test]
    fn test_purge_returns_prior_size() {
        let store = filled(6);
        assert_eq!(store.purge(), 6);
        assert_eq!(store.size(), 0);
        assert_eq!(store.purge(), 0);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let named = Participant::new(ParticipantId(5), Some("@bob".into()));
        assert_eq!(named.display_name(), "@bob");
        let blank = Participant::new(ParticipantId(5), Some(String::new()));
        assert_eq!(blank.display_name(), "5");
        assert_eq!(Participant::new(ParticipantId(5), None).display_name(), "5");
    }

    #[test]
    fn test_concurrent_joins_are_not_lost() {
        let store = Arc::new(QueueStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        // Overlapping ids across threads exercise dedup.
                        store.join(ParticipantId((t % 4) * 100 + i), None);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.size(), 200);
    }
}
