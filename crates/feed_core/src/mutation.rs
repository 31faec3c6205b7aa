use std::collections::{BTreeMap, VecDeque};

use crate::{Draft, FeedId};

pub type MutationId = u64;

const SETTLED_HISTORY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    Create { draft: Draft },
    Delete { target_id: FeedId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Optimistic,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub status: MutationStatus,
}

/// Create/delete mutations awaiting the server, plus a short history of settled ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct MutationLog {
    next_id: MutationId,
    outstanding: BTreeMap<MutationId, PendingMutation>,
    settled: VecDeque<PendingMutation>,
}

impl MutationLog {
    pub fn stage(&mut self, kind: MutationKind) -> MutationId {
        self.next_id += 1;
        let id = self.next_id;
        self.outstanding.insert(
            id,
            PendingMutation {
                id,
                kind,
                status: MutationStatus::Optimistic,
            },
        );
        id
    }

    /// Moves a mutation out of the optimistic set. Unknown ids yield `None`.
    pub fn settle(&mut self, id: MutationId, status: MutationStatus) -> Option<PendingMutation> {
        let mut mutation = self.outstanding.remove(&id)?;
        mutation.status = status;
        if self.settled.len() == SETTLED_HISTORY {
            self.settled.pop_front();
        }
        self.settled.push_back(mutation.clone());
        Some(mutation)
    }

    pub fn has_outstanding(&self) -> bool {
        !self.outstanding.is_empty()
    }

    pub fn is_deleting(&self, target: &str) -> bool {
        self.outstanding.values().any(|m| {
            matches!(&m.kind, MutationKind::Delete { target_id } if target_id == target)
        })
    }

    pub fn pending_deletes(&self) -> usize {
        self.outstanding
            .values()
            .filter(|m| matches!(m.kind, MutationKind::Delete { .. }))
            .count()
    }

    pub fn outstanding(&self) -> impl Iterator<Item = &PendingMutation> {
        self.outstanding.values()
    }

    pub fn settled(&self) -> impl Iterator<Item = &PendingMutation> {
        self.settled.iter()
    }
}
