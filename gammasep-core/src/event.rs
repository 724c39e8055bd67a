//! Per-event grouping of the three primary gammas.

use crate::hit::{Position, TrackId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The last recorded interaction of one gamma.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GammaHit {
    /// Interaction position.
    pub position: Position,
    /// Deposited energy (keV).
    pub energy: f64,
}

impl GammaHit {
    /// Energy reported for a gamma that was never registered.
    ///
    /// Simulation dumps encode absence as a negative energy; inside this
    /// crate absence is an `Option::None` and the sentinel only appears at
    /// the boundary (see [`FullEvent::energy_or_sentinel`]).
    pub const ABSENT_ENERGY: f64 = -1.0;

    /// Creates a new gamma hit.
    #[inline]
    #[must_use]
    pub fn new(position: Position, energy: f64) -> Self {
        Self { position, energy }
    }
}

/// All interactions recorded for a single simulation event.
///
/// Multiple scatters of the same track overwrite each other so only the
/// final recorded interaction is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FullEvent {
    /// Simulation event id.
    pub event_id: i32,
    /// Prompt gamma (track 1).
    pub prompt: Option<GammaHit>,
    /// First annihilation gamma (track 2).
    pub gamma1: Option<GammaHit>,
    /// Second annihilation gamma (track 3).
    pub gamma2: Option<GammaHit>,
}

impl FullEvent {
    /// Creates an event with all three gammas absent.
    #[must_use]
    pub fn new(event_id: i32) -> Self {
        Self {
            event_id,
            prompt: None,
            gamma1: None,
            gamma2: None,
        }
    }

    /// Records the latest interaction of `track`, replacing any earlier one.
    pub fn record(&mut self, track: TrackId, hit: GammaHit) {
        *self.slot_mut(track) = Some(hit);
    }

    /// Returns the recorded interaction of `track`.
    #[must_use]
    pub fn get(&self, track: TrackId) -> Option<GammaHit> {
        match track {
            TrackId::Prompt => self.prompt,
            TrackId::Gamma1 => self.gamma1,
            TrackId::Gamma2 => self.gamma2,
        }
    }

    /// Deposited energy of `track`, or [`GammaHit::ABSENT_ENERGY`].
    #[must_use]
    pub fn energy_or_sentinel(&self, track: TrackId) -> f64 {
        self.get(track).map_or(GammaHit::ABSENT_ENERGY, |hit| hit.energy)
    }

    /// Returns true if no gamma has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt.is_none() && self.gamma1.is_none() && self.gamma2.is_none()
    }

    /// Clears all three gammas, keeping the event id.
    pub fn reset(&mut self) {
        self.prompt = None;
        self.gamma1 = None;
        self.gamma2 = None;
    }

    fn slot_mut(&mut self, track: TrackId) -> &mut Option<GammaHit> {
        match track {
            TrackId::Prompt => &mut self.prompt,
            TrackId::Gamma1 => &mut self.gamma1,
            TrackId::Gamma2 => &mut self.gamma2,
        }
    }
}
