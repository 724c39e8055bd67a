//! One-dimensional fixed-binning histogram.
//!
//! Bins are numbered `1..=bins`; bin `0` collects underflow and bin
//! `bins + 1` overflow, so integrals can be asked over the same bin
//! numbers a `find_bin` lookup returns.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Binning of a [`Histogram`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramSpec {
    /// Number of regular bins.
    pub bins: usize,
    /// Lower edge of the first bin.
    pub min: f64,
    /// Upper edge of the last bin.
    pub max: f64,
}

impl Default for HistogramSpec {
    /// 500 bins over 0..1200 keV.
    fn default() -> Self {
        Self {
            bins: 500,
            min: 0.0,
            max: 1200.0,
        }
    }
}

impl HistogramSpec {
    /// Creates a new binning.
    #[must_use]
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    /// Checks that the binning describes a non-empty finite range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for zero bins or an empty/non-finite range.
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::InvalidBinning("bin count must be positive".into()));
        }
        if !self.min.is_finite() || !self.max.is_finite() || self.max <= self.min {
            return Err(Error::InvalidBinning(format!(
                "range [{}, {}) is empty or not finite",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Width of a single bin.
    #[inline]
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }
}

/// A frequency distribution over a fixed range.
///
/// Counts only ever grow; `entries` equals the number of `fill` calls.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram {
    name: String,
    title: String,
    spec: HistogramSpec,
    /// Bin contents including underflow (index 0) and overflow (last index).
    contents: Vec<u64>,
    entries: u64,
}

impl Histogram {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// Returns an error if the binning is invalid.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        spec: HistogramSpec,
    ) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            name: name.into(),
            title: title.into(),
            spec,
            contents: vec![0; spec.bins + 2],
            entries: 0,
        })
    }

    /// Creates an empty histogram with the default energy binning.
    #[must_use]
    pub fn energy(name: impl Into<String>, title: impl Into<String>) -> Self {
        let spec = HistogramSpec::default();
        Self {
            name: name.into(),
            title: title.into(),
            spec,
            contents: vec![0; spec.bins + 2],
            entries: 0,
        }
    }

    /// Bin number holding `x`: `0` below range, `bins + 1` at or above the
    /// upper edge (NaN is treated as overflow).
    #[must_use]
    pub fn find_bin(&self, x: f64) -> usize {
        if x.is_nan() || x >= self.spec.max {
            return self.spec.bins + 1;
        }
        if x < self.spec.min {
            return 0;
        }
        let bin = ((x - self.spec.min) / self.spec.bin_width()) as usize + 1;
        bin.min(self.spec.bins)
    }

    /// Adds one count at `x`, returning the bin that was incremented.
    pub fn fill(&mut self, x: f64) -> usize {
        let bin = self.find_bin(x);
        self.contents[bin] += 1;
        self.entries += 1;
        bin
    }

    /// Content of a bin (including under/overflow).
    #[must_use]
    #[inline]
    pub fn get(&self, bin: usize) -> Option<u64> {
        self.contents.get(bin).copied()
    }

    /// Sum of contents over the inclusive bin range `first..=last`.
    ///
    /// `last` beyond the overflow bin, or below `first`, is taken as the
    /// overflow bin.
    #[must_use]
    pub fn integral(&self, first: usize, last: usize) -> f64 {
        let overflow = self.spec.bins + 1;
        let last = if last > overflow || last < first {
            overflow
        } else {
            last
        };
        if first > last {
            return 0.0;
        }
        self.contents[first..=last].iter().sum::<u64>() as f64
    }

    /// Sum over the regular bins only.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.integral(1, self.spec.bins)
    }

    /// Number of fills, including those landing in under/overflow.
    #[must_use]
    #[inline]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Returns true if nothing has been filled.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Lower edge of a regular bin.
    #[must_use]
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.spec.min + (bin as f64 - 1.0) * self.spec.bin_width()
    }

    /// Centre of a regular bin.
    #[must_use]
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.bin_low_edge(bin) + 0.5 * self.spec.bin_width()
    }

    /// Contents of the regular bins, without under/overflow.
    #[must_use]
    pub fn bin_contents(&self) -> &[u64] {
        &self.contents[1..=self.spec.bins]
    }

    /// Underflow count.
    #[must_use]
    pub fn underflow(&self) -> u64 {
        self.contents[0]
    }

    /// Overflow count.
    #[must_use]
    pub fn overflow(&self) -> u64 {
        self.contents[self.spec.bins + 1]
    }

    /// Histogram name (used for file and column names).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Binning.
    #[must_use]
    pub fn spec(&self) -> HistogramSpec {
        self.spec
    }

    /// Largest regular-bin content.
    #[must_use]
    pub fn max_content(&self) -> u64 {
        self.bin_contents().iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_spec() {
        let spec = HistogramSpec::default();
        assert_eq!(spec.bins, 500);
        assert_relative_eq!(spec.bin_width(), 2.4);
    }

    #[test]
    fn test_invalid_spec() {
        assert!(HistogramSpec::new(0, 0.0, 10.0).validate().is_err());
        assert!(HistogramSpec::new(10, 5.0, 5.0).validate().is_err());
        assert!(HistogramSpec::new(10, 0.0, f64::INFINITY).validate().is_err());
        assert!(Histogram::new("h", "h", HistogramSpec::new(10, 1.0, 0.0)).is_err());
    }

    #[test]
    fn test_find_bin() {
        let h = Histogram::energy("h", "h");
        assert_eq!(h.find_bin(-1.0), 0);
        assert_eq!(h.find_bin(0.0), 1);
        assert_eq!(h.find_bin(2.39), 1);
        assert_eq!(h.find_bin(2.4), 2);
        assert_eq!(h.find_bin(1158.0), 483);
        assert_eq!(h.find_bin(1199.99), 500);
        assert_eq!(h.find_bin(1200.0), 501);
        assert_eq!(h.find_bin(f64::NAN), 501);
    }

    #[test]
    fn test_fill_and_integral() {
        let mut h = Histogram::new("h", "h", HistogramSpec::new(10, 0.0, 10.0)).unwrap();
        h.fill(0.5);
        h.fill(0.7);
        h.fill(5.5);
        h.fill(-3.0);
        h.fill(42.0);

        assert_eq!(h.entries(), 5);
        assert_eq!(h.get(1), Some(2));
        assert_eq!(h.get(6), Some(1));
        assert_eq!(h.underflow(), 1);
        assert_eq!(h.overflow(), 1);

        assert_relative_eq!(h.integral(1, 10), 3.0);
        assert_relative_eq!(h.integral(0, 11), 5.0);
        assert_relative_eq!(h.integral(2, 5), 0.0);
        assert_relative_eq!(h.integral(6, 6), 1.0);
        assert_relative_eq!(h.total(), 3.0);
        assert_eq!(h.max_content(), 2);
    }

    #[test]
    fn test_integral_clamps_upper_bin() {
        let mut h = Histogram::new("h", "h", HistogramSpec::new(4, 0.0, 4.0)).unwrap();
        h.fill(3.5);
        h.fill(10.0);
        assert_relative_eq!(h.integral(4, 100), 2.0);
        assert_relative_eq!(h.integral(4, 2), 2.0);
    }

    #[test]
    fn test_bin_geometry() {
        let h = Histogram::new("h", "h", HistogramSpec::new(4, 0.0, 8.0)).unwrap();
        assert_relative_eq!(h.bin_low_edge(1), 0.0);
        assert_relative_eq!(h.bin_center(1), 1.0);
        assert_relative_eq!(h.bin_center(4), 7.0);
        assert_eq!(h.bin_contents().len(), 4);
    }
}
