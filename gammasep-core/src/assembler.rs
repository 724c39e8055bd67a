//! Grouping of consecutive hit records into per-event records.
//!
//! The simulation writes hits event by event, so an event is complete once
//! a hit with a different event id shows up. The hit that crosses the
//! boundary belongs to the new event; it is validated before the completed
//! event is handed out so a broken record never lets a partial run through.

use crate::event::{FullEvent, GammaHit};
use crate::hit::{HitRecord, TrackId};
use crate::{Error, Result};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters collected while assembling events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssemblerStatistics {
    /// Hits passed to [`EventAssembler::observe`].
    pub hits_observed: u64,
    /// Hits that updated a prompt or annihilation slot.
    pub hits_recorded: u64,
    /// Hits from secondaries or unknown emission lines.
    pub hits_ignored: u64,
    /// Completed events handed out (including the final flush).
    pub events_emitted: u64,
}

/// Stateful hit-to-event grouping.
///
/// Call [`observe`](Self::observe) for every hit in stream order, then
/// [`flush`](Self::flush) once at end of stream to obtain the last event.
#[derive(Debug, Clone, Default)]
pub struct EventAssembler {
    current: Option<FullEvent>,
    stats: AssemblerStatistics,
}

impl EventAssembler {
    /// Creates an assembler that has not seen any event yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one hit into the current event.
    ///
    /// Returns the previous event when `hit` starts a new one.
    ///
    /// # Errors
    /// Returns [`Error::InvariantViolation`] when the hit's track id and
    /// emission energy disagree. Nothing is emitted or recorded in that case.
    pub fn observe(&mut self, hit: &HitRecord) -> Result<Option<FullEvent>> {
        self.stats.hits_observed += 1;
        let track = classify(hit)?;

        let completed = match self.current {
            Some(ref event) if event.event_id == hit.event_id => None,
            _ => self.current.replace(FullEvent::new(hit.event_id)),
        };
        if let Some(ref event) = completed {
            self.stats.events_emitted += 1;
            debug!("event {} complete", event.event_id);
        }

        match (track, self.current.as_mut()) {
            (Some(track), Some(event)) => {
                event.record(track, GammaHit::new(hit.position, hit.deposited_energy));
                self.stats.hits_recorded += 1;
            }
            _ => self.stats.hits_ignored += 1,
        }

        Ok(completed)
    }

    /// Hands out the in-progress event, if any.
    ///
    /// A second call without intervening hits returns `None`.
    pub fn flush(&mut self) -> Option<FullEvent> {
        let event = self.current.take();
        if event.is_some() {
            self.stats.events_emitted += 1;
        }
        event
    }

    /// Event currently being assembled.
    #[must_use]
    pub fn current(&self) -> Option<&FullEvent> {
        self.current.as_ref()
    }

    /// Counters so far.
    #[must_use]
    pub fn statistics(&self) -> AssemblerStatistics {
        self.stats
    }
}

/// Returns the slot a hit updates, `None` for hits that are ignored.
fn classify(hit: &HitRecord) -> Result<Option<TrackId>> {
    let Some(line) = hit.emission_line() else {
        return Ok(None);
    };
    let Some(track) = hit.track() else {
        return Ok(None);
    };
    if track.expected_line() != line {
        return Err(Error::InvariantViolation {
            event_id: hit.event_id,
            track_id: hit.track_id,
            emission_energy: hit.emission_energy,
        });
    }
    Ok(Some(track))
}
