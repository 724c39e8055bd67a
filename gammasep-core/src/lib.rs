//! gammasep-core: Core types for prompt-gamma separation studies.
//!
//! This crate provides the hit record read from a simulation output,
//! the per-event grouping of hits into a [`FullEvent`], the stateful
//! [`EventAssembler`] that performs that grouping, and the fixed-binning
//! [`Histogram`] used to accumulate deposited energies.
//!

pub mod assembler;
pub mod error;
pub mod event;
pub mod histogram;
pub mod hit;

pub use assembler::{AssemblerStatistics, EventAssembler};
pub use error::{Error, Result};
pub use event::{FullEvent, GammaHit};
pub use histogram::{Histogram, HistogramSpec};
pub use hit::{
    EmissionLine, HitRecord, Position, TrackId, ANNIHILATION_ENERGY_KEV, EMISSION_TOLERANCE_KEV,
    PROMPT_ENERGY_KEV,
};
