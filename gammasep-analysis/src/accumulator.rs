//! Classification of assembled events into the five energy histograms.
#![allow(clippy::doc_markdown)]

use gammasep_core::{Error, FullEvent, GammaHit, Histogram, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for histogram accumulation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccumulatorConfig {
    /// Blur energies with the detector resolution model before binning.
    pub smearing_enabled: bool,
    /// Treat channels below `low_energy_threshold_kev` as not registered.
    pub low_energy_cut_enabled: bool,
    /// Low-energy cut threshold (keV, default: 100).
    pub low_energy_threshold_kev: f64,
    /// Resolution coefficient at 1 MeV (default: 0.0444).
    pub resolution_coefficient: f64,
    /// Fixed seed for smearing; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            smearing_enabled: false,
            low_energy_cut_enabled: false,
            low_energy_threshold_kev: 100.0,
            resolution_coefficient: 0.0444,
            seed: None,
        }
    }
}

impl AccumulatorConfig {
    /// Enable or disable energy smearing.
    #[must_use]
    pub fn with_smearing(mut self, enabled: bool) -> Self {
        self.smearing_enabled = enabled;
        self
    }

    /// Enable the low-energy cut at `threshold_kev`.
    #[must_use]
    pub fn with_low_energy_cut(mut self, threshold_kev: f64) -> Self {
        self.low_energy_cut_enabled = true;
        self.low_energy_threshold_kev = threshold_kev;
        self
    }

    /// Set the resolution coefficient.
    #[must_use]
    pub fn with_resolution_coefficient(mut self, coefficient: f64) -> Self {
        self.resolution_coefficient = coefficient;
        self
    }

    /// Set a fixed smearing seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate parameter ranges.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a negative or non-finite threshold
    /// or a non-positive resolution coefficient.
    pub fn validate(&self) -> Result<()> {
        if !self.low_energy_threshold_kev.is_finite() || self.low_energy_threshold_kev < 0.0 {
            return Err(Error::ConfigError(format!(
                "low energy threshold must be a non-negative number of keV, got {}",
                self.low_energy_threshold_kev
            )));
        }
        if !self.resolution_coefficient.is_finite() || self.resolution_coefficient <= 0.0 {
            return Err(Error::ConfigError(format!(
                "resolution coefficient must be positive, got {}",
                self.resolution_coefficient
            )));
        }
        Ok(())
    }
}

/// Gaussian detector energy resolution.
///
/// sigma(E) = 1000 * (k / sqrt(E / 1000)) * (E / 1000) keV, i.e. the
/// relative resolution scales as k / sqrt(E[MeV]).
#[derive(Debug, Clone)]
pub struct EnergySmearing {
    rng: StdRng,
    coefficient: f64,
}

impl EnergySmearing {
    /// Seeded from the operating system.
    #[must_use]
    pub fn from_entropy(coefficient: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            coefficient,
        }
    }

    /// Reproducible smearing.
    #[must_use]
    pub fn seeded(coefficient: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            coefficient,
        }
    }

    /// Resolution (standard deviation, keV) at `energy_kev`.
    #[must_use]
    pub fn sigma_kev(&self, energy_kev: f64) -> f64 {
        let mev = energy_kev / 1000.0;
        1000.0 * (self.coefficient / mev.sqrt()) * mev
    }

    /// Draws a smeared energy; non-positive energies are returned unchanged.
    pub fn smear(&mut self, energy_kev: f64) -> f64 {
        if energy_kev <= 0.0 {
            return energy_kev;
        }
        let sigma = self.sigma_kev(energy_kev);
        Normal::new(energy_kev, sigma).map_or(energy_kev, |d| d.sample(&mut self.rng))
    }
}

/// The five running energy histograms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergyHistograms {
    /// Every registered prompt gamma.
    pub all_prompt: Histogram,
    /// Every registered annihilation gamma (both of the pair).
    pub all_511: Histogram,
    /// Prompt energy when all three gammas were registered.
    pub prompt_3det: Histogram,
    /// Prompt energy when the prompt and gamma 1 were registered.
    pub prompt_det_gamma1: Histogram,
    /// Prompt energy when the prompt and gamma 2 were registered.
    pub prompt_det_gamma2: Histogram,
}

impl Default for EnergyHistograms {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyHistograms {
    /// Creates the five empty histograms (500 bins, 0..1200 keV).
    #[must_use]
    pub fn new() -> Self {
        Self {
            all_prompt: Histogram::energy("all_prompt", "All prompt gamma energies"),
            all_511: Histogram::energy("all_511", "All 511 keV gamma energies"),
            prompt_3det: Histogram::energy("prompt_3det", "Prompt with 3 detections"),
            prompt_det_gamma1: Histogram::energy(
                "prompt_det_gamma1",
                "Prompt with detected prompt and gamma 1",
            ),
            prompt_det_gamma2: Histogram::energy(
                "prompt_det_gamma2",
                "Prompt with detected prompt and gamma 2",
            ),
        }
    }

    /// All five histograms in a fixed order.
    #[must_use]
    pub fn all(&self) -> [&Histogram; 5] {
        [
            &self.all_prompt,
            &self.all_511,
            &self.prompt_3det,
            &self.prompt_det_gamma1,
            &self.prompt_det_gamma2,
        ]
    }
}

/// Applies the fill rules to each completed event.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    config: AccumulatorConfig,
    histograms: EnergyHistograms,
    smearing: Option<EnergySmearing>,
    events: u64,
}

impl HistogramAccumulator {
    /// Creates an accumulator with empty histograms.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AccumulatorConfig) -> Result<Self> {
        config.validate()?;
        let smearing = config.smearing_enabled.then(|| match config.seed {
            Some(seed) => EnergySmearing::seeded(config.resolution_coefficient, seed),
            None => EnergySmearing::from_entropy(config.resolution_coefficient),
        });
        Ok(Self {
            config,
            histograms: EnergyHistograms::new(),
            smearing,
            events: 0,
        })
    }

    /// Fills the histograms from one event.
    pub fn accumulate(&mut self, event: &FullEvent) {
        let prompt = self.channel_energy(event.prompt);
        let gamma1 = self.channel_energy(event.gamma1);
        let gamma2 = self.channel_energy(event.gamma2);
        self.events += 1;
        debug!(
            "event {}: prompt {prompt:?}, gamma1 {gamma1:?}, gamma2 {gamma2:?}",
            event.event_id
        );

        let h = &mut self.histograms;
        if let Some(e) = prompt {
            h.all_prompt.fill(e);
        }
        if let Some(e) = gamma1 {
            h.all_511.fill(e);
        }
        if let Some(e) = gamma2 {
            h.all_511.fill(e);
        }

        let Some(prompt) = prompt else {
            return;
        };
        if gamma1.is_some() && gamma2.is_some() {
            h.prompt_3det.fill(prompt);
        }
        if gamma1.is_some() {
            h.prompt_det_gamma1.fill(prompt);
        }
        if gamma2.is_some() {
            h.prompt_det_gamma2.fill(prompt);
        }
    }

    /// Energy used for binning, `None` when the channel counts as not registered.
    fn channel_energy(&mut self, hit: Option<GammaHit>) -> Option<f64> {
        let mut energy = hit?.energy;
        if let Some(smearing) = self.smearing.as_mut() {
            energy = smearing.smear(energy);
        }
        if self.config.low_energy_cut_enabled && energy < self.config.low_energy_threshold_kev {
            return None;
        }
        (energy > 0.0).then_some(energy)
    }

    /// Current histogram state.
    #[must_use]
    pub fn histograms(&self) -> &EnergyHistograms {
        &self.histograms
    }

    /// Consumes the accumulator, returning the histograms.
    #[must_use]
    pub fn into_histograms(self) -> EnergyHistograms {
        self.histograms
    }

    /// Number of events accumulated.
    #[must_use]
    pub fn events_accumulated(&self) -> u64 {
        self.events
    }
}
