//! Process lifecycle state machine
//!
//! `Starting → Listening → Draining → Closed`, strictly forward. The current
//! phase lives in a watch channel shared by every clone; `/health` reports it.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Listening,
    Draining,
    Closed,
}

impl Phase {
    fn next(self) -> Option<Phase> {
        match self {
            Phase::Starting => Some(Phase::Listening),
            Phase::Listening => Some(Phase::Draining),
            Phase::Draining => Some(Phase::Closed),
            Phase::Closed => None,
        }
    }

    /// Phases that may directly follow `self`.
    ///
    /// Startup can fail before listening, so `Starting` may also jump to `Closed`.
    fn may_advance_to(self, to: Phase) -> bool {
        self.next() == Some(to) || (self == Phase::Starting && to == Phase::Closed)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid lifecycle transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Phase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }

    pub fn advance(&self, to: Phase) -> Result<(), TransitionError> {
        let mut from = to;
        let advanced = self.tx.send_if_modified(|phase| {
            from = *phase;
            if phase.may_advance_to(to) {
                *phase = to;
                true
            } else {
                false
            }
        });

        if advanced {
            tracing::debug!(?from, ?to, "Lifecycle transition");
            Ok(())
        } else {
            Err(TransitionError { from, to })
        }
    }
}
