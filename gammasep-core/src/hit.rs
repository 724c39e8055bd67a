//! Hit record types read from the simulation output.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Emission energy of the prompt gamma (keV).
pub const PROMPT_ENERGY_KEV: f64 = 1157.0;

/// Emission energy of each annihilation gamma (keV).
pub const ANNIHILATION_ENERGY_KEV: f64 = 511.0;

/// Absolute tolerance used when matching emission energies (keV).
pub const EMISSION_TOLERANCE_KEV: f64 = 1e-6;

/// Interaction position in the detector frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Track identifiers assigned by the simulation.
///
/// Track 1 is the prompt gamma, tracks 2 and 3 the annihilation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackId {
    /// Prompt gamma (track 1).
    Prompt,
    /// First annihilation gamma (track 2).
    Gamma1,
    /// Second annihilation gamma (track 3).
    Gamma2,
}

impl TrackId {
    /// Maps a raw simulation track id, returning `None` for secondaries.
    #[inline]
    #[must_use]
    pub fn from_raw(track_id: i32) -> Option<Self> {
        match track_id {
            1 => Some(Self::Prompt),
            2 => Some(Self::Gamma1),
            3 => Some(Self::Gamma2),
            _ => None,
        }
    }

    /// Emission line this track is required to carry.
    #[inline]
    #[must_use]
    pub fn expected_line(self) -> EmissionLine {
        match self {
            Self::Prompt => EmissionLine::Prompt,
            Self::Gamma1 | Self::Gamma2 => EmissionLine::Annihilation,
        }
    }
}

/// Known source emission lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EmissionLine {
    /// 1157 keV prompt gamma.
    Prompt,
    /// 511 keV annihilation gamma.
    Annihilation,
}

impl EmissionLine {
    /// Classifies an emission energy, returning `None` when it matches neither line.
    #[must_use]
    pub fn classify(energy_kev: f64) -> Option<Self> {
        if approx_eq(energy_kev, PROMPT_ENERGY_KEV) {
            Some(Self::Prompt)
        } else if approx_eq(energy_kev, ANNIHILATION_ENERGY_KEV) {
            Some(Self::Annihilation)
        } else {
            None
        }
    }
}

#[inline]
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EMISSION_TOLERANCE_KEV
}

/// A single energy deposit recorded by the simulation.
///
/// Produced by the record source and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitRecord {
    /// Simulation event id.
    pub event_id: i32,
    /// Raw track id (1 = prompt, 2/3 = annihilation pair).
    pub track_id: i32,
    /// Energy deposited in this interaction (keV).
    pub deposited_energy: f64,
    /// Energy of the primary at emission from the source (keV).
    pub emission_energy: f64,
    /// Interaction position.
    pub position: Position,
}

impl HitRecord {
    /// Creates a new hit record.
    #[must_use]
    pub fn new(
        event_id: i32,
        track_id: i32,
        deposited_energy: f64,
        emission_energy: f64,
        position: Position,
    ) -> Self {
        Self {
            event_id,
            track_id,
            deposited_energy,
            emission_energy,
            position,
        }
    }

    /// Track classification, if this is one of the three primaries.
    #[inline]
    #[must_use]
    pub fn track(&self) -> Option<TrackId> {
        TrackId::from_raw(self.track_id)
    }

    /// Emission line classification.
    #[inline]
    #[must_use]
    pub fn emission_line(&self) -> Option<EmissionLine> {
        EmissionLine::classify(self.emission_energy)
    }
}
