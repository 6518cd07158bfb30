//! Pull scheduler: turns transport time into successive event windows

use crate::{Arrangement, Clock, Tempo};
use arc_swap::ArcSwap;
use plaid_core::{Event, Fraction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared, atomically replaceable arrangement
///
/// Clones point at the same slot. A swap is seen by the next query; queries
/// already running finish on the arrangement they loaded.
#[derive(Debug, Clone)]
pub struct ArrangementHandle {
    current: Arc<ArcSwap<Arrangement>>,
}

impl ArrangementHandle {
    pub fn new(arrangement: Arrangement) -> Self {
        ArrangementHandle {
            current: Arc::new(ArcSwap::from_pointee(arrangement)),
        }
    }

    /// Snapshot of the current arrangement
    pub fn load(&self) -> Arc<Arrangement> {
        self.current.load_full()
    }

    /// Replace the arrangement for all subsequent queries
    pub fn swap(&self, arrangement: Arrangement) {
        info!(
            sections = arrangement.section_names().count(),
            cycles = %arrangement.total_cycles(),
            "swapping arrangement"
        );
        self.current.store(Arc::new(arrangement));
    }
}

/// Queries the arrangement window by window as transport time advances
pub struct Scheduler {
    arrangement: ArrangementHandle,
    clock: Clock,
    /// End of the last window handed out
    cursor: Fraction,
    lookahead: Duration,
}

impl Scheduler {
    pub fn new(arrangement: Arrangement, tempo: Tempo) -> Self {
        Scheduler {
            arrangement: ArrangementHandle::new(arrangement),
            clock: Clock::new(tempo),
            cursor: Fraction::zero(),
            lookahead: Duration::from_millis(100),
        }
    }

    /// How far ahead of `now` each update reaches
    pub fn with_lookahead(mut self, lookahead: Duration) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn handle(&self) -> ArrangementHandle {
        self.arrangement.clone()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn tempo(&self) -> Tempo {
        self.clock.tempo()
    }

    pub fn cursor(&self) -> Fraction {
        self.cursor
    }

    /// Events due between the last update and `now + lookahead`
    ///
    /// The cursor only moves when the query succeeds, so a failed window is
    /// retried on the next call and no event is emitted twice.
    pub fn update(&mut self, now: Duration) -> plaid_core::Result<Vec<Event>> {
        let target = self.clock.cycle_at(now.saturating_add(self.lookahead));
        if target <= self.cursor {
            return Ok(Vec::new());
        }

        let arrangement = self.arrangement.load();
        let events = arrangement.query(self.cursor, target)?;
        debug!(
            from = %self.cursor,
            to = %target,
            events = events.len(),
            "scheduled window"
        );

        self.cursor = target;
        Ok(events)
    }

    /// Change tempo at transport time `now`
    pub fn set_tempo(&mut self, now: Duration, tempo: Tempo) {
        self.clock.set_tempo(now, tempo);
        let reach = self.clock.cycle_at(now.saturating_add(self.lookahead));
        if reach < self.cursor {
            warn!(
                cursor = %self.cursor,
                reach = %reach,
                "tempo change leaves scheduled cycles ahead of the clock"
            );
        }
        info!(bpm = tempo.bpm(), "tempo changed");
    }

    /// Rewind to cycle 0
    pub fn reset(&mut self) {
        self.clock.reset();
        self.cursor = Fraction::zero();
    }
}
