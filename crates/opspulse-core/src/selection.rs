//! Week selection tracking
//!
//! A comparison is computed against the `(current, previous)` pair captured
//! when its week was selected. If the user picks another week before the
//! result is delivered, the in-flight result is discarded rather than mixed
//! with the new selection.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::WeekId;

/// Proof of one `select` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
    pub week: WeekId,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct WeekSelector {
    generation: AtomicU64,
}

impl WeekSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new selection, superseding all earlier tickets
    pub fn select(&self, week: WeekId) -> SelectionTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SelectionTicket { week, generation }
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Hand back `result` only if `ticket` is still the latest selection
    pub fn publish<T>(&self, ticket: &SelectionTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(week = %ticket.week, "Discarding result for superseded selection");
            None
        }
    }
}
