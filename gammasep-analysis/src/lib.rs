//! gammasep-analysis: Event classification and threshold statistics.
//!
//! - [`HistogramAccumulator`] fills the five energy histograms from
//!   assembled events, optionally applying energy smearing and a
//!   low-energy cut.
//! - [`ThresholdCurveDeriver`] turns the two primary histograms into
//!   purity, efficiency and ROC curves.
//! - [`process_hits`] runs the whole pass over a hit stream.
//!
#![warn(missing_docs)]

mod accumulator;
mod curves;
mod processing;

pub use accumulator::{
    AccumulatorConfig, EnergyHistograms, EnergySmearing, HistogramAccumulator,
};
pub use curves::{CurveSet, DerivedCurve, ThresholdCurveDeriver, ThresholdGrid};
pub use processing::{process_hits, process_records, AnalysisResult, RunStatistics};

// Re-export core types used in the public API
pub use gammasep_core::{FullEvent, Histogram, HitRecord};
