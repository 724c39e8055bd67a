//! Single-pass pipeline: assemble, accumulate, derive.

use crate::{AccumulatorConfig, CurveSet, EnergyHistograms, HistogramAccumulator};
use crate::{ThresholdCurveDeriver, ThresholdGrid};
use gammasep_core::{EventAssembler, HitRecord};
use log::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStatistics {
    /// Hit records read from the source.
    pub hits_read: u64,
    /// Hits that updated an event slot.
    pub hits_recorded: u64,
    /// Hits from secondaries or unknown emission lines.
    pub hits_ignored: u64,
    /// Events assembled and accumulated.
    pub events: u64,
}

/// Final state of a run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisResult {
    /// The five energy histograms.
    pub histograms: EnergyHistograms,
    /// The six threshold curves.
    pub curves: CurveSet,
    /// Run counters.
    pub statistics: RunStatistics,
}

/// Runs the full pass over a fallible hit stream.
///
/// Histograms are only derived after the stream is exhausted; the first
/// error (from the stream or an invariant violation) aborts the run.
///
/// # Errors
/// Returns the first source error, or a converted core error for invalid
/// configuration or an invariant violation.
pub fn process_hits<I, E>(
    hits: I,
    config: &AccumulatorConfig,
    grid: ThresholdGrid,
) -> Result<AnalysisResult, E>
where
    I: IntoIterator<Item = Result<HitRecord, E>>,
    E: From<gammasep_core::Error>,
{
    let mut assembler = EventAssembler::new();
    let mut accumulator = HistogramAccumulator::new(config.clone())?;

    for hit in hits {
        if let Some(event) = assembler.observe(&hit?)? {
            accumulator.accumulate(&event);
        }
    }
    if let Some(event) = assembler.flush() {
        accumulator.accumulate(&event);
    }

    let assembled = assembler.statistics();
    let statistics = RunStatistics {
        hits_read: assembled.hits_observed,
        hits_recorded: assembled.hits_recorded,
        hits_ignored: assembled.hits_ignored,
        events: accumulator.events_accumulated(),
    };
    info!(
        "assembled {} events from {} hits ({} ignored)",
        statistics.events, statistics.hits_read, statistics.hits_ignored
    );

    let histograms = accumulator.into_histograms();
    let curves =
        ThresholdCurveDeriver::new(grid).derive(&histograms.all_prompt, &histograms.all_511);

    Ok(AnalysisResult {
        histograms,
        curves,
        statistics,
    })
}

/// Runs the full pass over in-memory records.
///
/// # Errors
/// Returns an error for invalid configuration or an invariant violation.
pub fn process_records<I>(
    hits: I,
    config: &AccumulatorConfig,
    grid: ThresholdGrid,
) -> gammasep_core::Result<AnalysisResult>
where
    I: IntoIterator<Item = HitRecord>,
{
    process_hits(hits.into_iter().map(Ok), config, grid)
}
