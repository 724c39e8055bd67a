//! Chart rendering (SVG).

#![allow(clippy::cast_precision_loss)]

use crate::{Error, Result};
use gammasep_analysis::{AnalysisResult, DerivedCurve};
use gammasep_core::Histogram;
use log::debug;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const SIZE: (u32, u32) = (1000, 1000);

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Step-line outline of a histogram's regular bins.
fn outline(h: &Histogram) -> Vec<(f64, f64)> {
    let width = h.spec().bin_width();
    let mut points = Vec::with_capacity(2 * h.spec().bins);
    for (i, &count) in h.bin_contents().iter().enumerate() {
        let low = h.bin_low_edge(i + 1);
        points.push((low, count as f64));
        points.push((low + width, count as f64));
    }
    points
}

/// Renders histograms and curves into a directory.
pub struct ChartRenderer {
    dir: PathBuf,
}

impl ChartRenderer {
    /// Creates a renderer writing into `dir` (which must exist).
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Renders the histogram overlay, the three coincidence histograms
    /// and the six curves.
    ///
    /// # Errors
    /// Returns an error if any chart cannot be drawn or written.
    pub fn render_all(&self, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
        let h = &result.histograms;
        let mut written = vec![self.render_histograms(
            "all_energies",
            "All energies",
            &[(&h.all_511, BLACK), (&h.all_prompt, RED)],
        )?];
        for single in [&h.prompt_3det, &h.prompt_det_gamma1, &h.prompt_det_gamma2] {
            let series = [(single, BLACK)];
            written.push(self.render_histograms(single.name(), single.title(), &series)?);
        }
        for curve in result.curves.all() {
            written.push(self.render_curve(curve)?);
        }
        Ok(written)
    }

    /// Draws one or more histograms on shared axes.
    ///
    /// # Errors
    /// Returns an error if the chart cannot be drawn or written.
    pub fn render_histograms(
        &self,
        file_stem: &str,
        title: &str,
        series: &[(&Histogram, RGBColor)],
    ) -> Result<PathBuf> {
        let path = self.dir.join(format!("{file_stem}.svg"));
        let (x_min, x_max) = series
            .first()
            .map_or((0.0, 1.0), |(h, _)| (h.spec().min, h.spec().max));
        let y_max = series
            .iter()
            .map(|(h, _)| h.max_content())
            .max()
            .unwrap_or(0)
            .max(1) as f64
            * 1.1;

        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .x_desc("energy [keV]")
            .y_desc("counts")
            .draw()
            .map_err(render_err)?;

        for &(h, color) in series {
            chart
                .draw_series(LineSeries::new(outline(h), color))
                .map_err(render_err)?
                .label(h.title())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }
        root.present().map_err(render_err)?;
        debug!("rendered {}", path.display());
        Ok(path.clone())
    }

    /// Draws a derived curve.
    ///
    /// # Errors
    /// Returns an error if the chart cannot be drawn or written.
    pub fn render_curve(&self, curve: &DerivedCurve) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.svg", curve.name));
        let x_max = curve
            .points
            .iter()
            .map(|&(x, _)| x)
            .fold(1.0_f64, f64::max);

        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&curve.title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..x_max, 0.0..1.05)
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .x_desc(curve.x_label.as_str())
            .y_desc(curve.y_label.as_str())
            .draw()
            .map_err(render_err)?;
        chart
            .draw_series(LineSeries::new(curve.points.iter().copied(), BLACK))
            .map_err(render_err)?;
        root.present().map_err(render_err)?;
        debug!("rendered {}", path.display());
        Ok(path.clone())
    }
}
