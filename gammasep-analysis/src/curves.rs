//! Purity, efficiency and ROC curves from an energy-threshold sweep.
//!
//! For a threshold `t`, the prompt channel keeps everything at or above
//! `t` and the 511 keV channel everything at or below it. With `P` the
//! all-prompt histogram and `F` the all-511 histogram, cumulated up to the
//! bin holding the grid maximum:
//!
//! | curve              | value at `t`                         |
//! |--------------------|--------------------------------------|
//! | efficiency prompt  | `P[t, max] / P[0, max]`              |
//! | purity prompt      | `P[t, max] / (P[t, max] + F[t, max])`|
//! | FPR prompt         | `F[0, t] / F[0, max]`                |
//! | efficiency 511     | `F[0, t] / F[0, max]`                |
//! | purity 511         | `F[0, t] / (P[0, t] + F[0, t])`      |
//! | FPR 511            | `P[0, t] / P[0, max]`                |
//!
//! A ratio with a zero denominator is defined as `0.0`.

#![allow(clippy::cast_precision_loss)]

use gammasep_core::Histogram;

const THRESHOLD: &str = "energy threshold [keV]";

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy thresholds swept by the deriver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdGrid {
    /// First threshold (keV).
    pub min: f64,
    /// Upper end of the sweep (keV), also the upper integration limit.
    pub max: f64,
    /// Number of thresholds.
    pub steps: usize,
}

impl Default for ThresholdGrid {
    /// 1158 one-keV steps starting at 0.
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1158.0,
            steps: 1158,
        }
    }
}

impl ThresholdGrid {
    /// Distance between thresholds.
    #[must_use]
    pub fn step(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            (self.max - self.min) / self.steps as f64
        }
    }

    /// Threshold energies, `min` inclusive, `max` exclusive.
    pub fn thresholds(&self) -> impl Iterator<Item = f64> {
        let (min, step) = (self.min, self.step());
        (0..self.steps).map(move |i| min + step * i as f64)
    }
}

/// An ordered series of `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DerivedCurve {
    /// Identifier used for file names.
    pub name: String,
    /// Plot title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Points in threshold order.
    pub points: Vec<(f64, f64)>,
}

impl DerivedCurve {
    fn new(
        name: &str,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: Vec<(f64, f64)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points,
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Y value of the i-th point.
    #[must_use]
    pub fn y(&self, i: usize) -> Option<f64> {
        self.points.get(i).map(|&(_, y)| y)
    }
}

/// The six derived curves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurveSet {
    /// Purity of the prompt selection versus threshold.
    pub purity_prompt: DerivedCurve,
    /// Efficiency of the prompt selection versus threshold.
    pub efficiency_prompt: DerivedCurve,
    /// Parametric (efficiency prompt, FPR prompt).
    pub roc_prompt: DerivedCurve,
    /// Purity of the 511 keV selection versus threshold.
    pub purity_511: DerivedCurve,
    /// Efficiency of the 511 keV selection versus threshold.
    pub efficiency_511: DerivedCurve,
    /// Parametric (efficiency 511, FPR 511).
    pub roc_511: DerivedCurve,
}

impl CurveSet {
    /// All six curves in a fixed order.
    #[must_use]
    pub fn all(&self) -> [&DerivedCurve; 6] {
        [
            &self.purity_prompt,
            &self.efficiency_prompt,
            &self.roc_prompt,
            &self.purity_511,
            &self.efficiency_511,
            &self.roc_511,
        ]
    }
}

/// Computes [`CurveSet`]s from final histogram state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdCurveDeriver {
    grid: ThresholdGrid,
}

impl ThresholdCurveDeriver {
    /// Creates a deriver over `grid`.
    #[must_use]
    pub fn new(grid: ThresholdGrid) -> Self {
        Self { grid }
    }

    /// Sweeps the grid. Pure: the same histograms always give the same curves.
    #[must_use]
    pub fn derive(&self, all_prompt: &Histogram, all_511: &Histogram) -> CurveSet {
        let n = self.grid.steps;
        let mut purity_prompt = Vec::with_capacity(n);
        let mut efficiency_prompt = Vec::with_capacity(n);
        let mut roc_prompt = Vec::with_capacity(n);
        let mut purity_511 = Vec::with_capacity(n);
        let mut efficiency_511 = Vec::with_capacity(n);
        let mut roc_511 = Vec::with_capacity(n);

        let p = Cumulative::new(all_prompt, &self.grid);
        let f = Cumulative::new(all_511, &self.grid);

        for energy in self.grid.thresholds() {
            let p_above = p.above(energy);
            let f_above = f.above(energy);
            let p_below = p.below(energy);
            let f_below = f.below(energy);

            let tpr_prompt = ratio(p_above, p.total);
            let fpr_prompt = ratio(f_below, f.total);
            let tpr_511 = ratio(f_below, f.total);
            let fpr_511 = ratio(p_below, p.total);

            purity_prompt.push((energy, ratio(p_above, p_above + f_above)));
            efficiency_prompt.push((energy, tpr_prompt));
            roc_prompt.push((tpr_prompt, fpr_prompt));
            purity_511.push((energy, ratio(f_below, p_below + f_below)));
            efficiency_511.push((energy, tpr_511));
            roc_511.push((tpr_511, fpr_511));
        }

        CurveSet {
            purity_prompt: DerivedCurve::new(
                "purity_prompt",
                "purity prompt",
                THRESHOLD,
                "PPV",
                purity_prompt,
            ),
            efficiency_prompt: DerivedCurve::new(
                "efficiency_prompt",
                "efficiency prompt",
                THRESHOLD,
                "TPR",
                efficiency_prompt,
            ),
            roc_prompt: DerivedCurve::new("roc_prompt", "ROC prompt", "TPR", "FPR", roc_prompt),
            purity_511: DerivedCurve::new(
                "purity_511",
                "purity 511",
                THRESHOLD,
                "PPV",
                purity_511,
            ),
            efficiency_511: DerivedCurve::new(
                "efficiency_511",
                "efficiency 511",
                THRESHOLD,
                "TPR",
                efficiency_511,
            ),
            roc_511: DerivedCurve::new("roc_511", "ROC 511", "TPR", "FPR", roc_511),
        }
    }
}

/// Bin-range integrals of one histogram bounded by the grid.
struct Cumulative<'a> {
    hist: &'a Histogram,
    first: usize,
    last: usize,
    total: f64,
}

impl<'a> Cumulative<'a> {
    fn new(hist: &'a Histogram, grid: &ThresholdGrid) -> Self {
        let first = hist.find_bin(grid.min);
        let last = hist.find_bin(grid.max);
        Self {
            hist,
            first,
            last,
            total: hist.integral(first, last),
        }
    }

    fn above(&self, energy: f64) -> f64 {
        self.hist.integral(self.hist.find_bin(energy), self.last)
    }

    fn below(&self, energy: f64) -> f64 {
        self.hist.integral(self.first, self.hist.find_bin(energy))
    }
}

#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
