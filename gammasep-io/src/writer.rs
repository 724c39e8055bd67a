//! Result file writers.
//!
//! Every file is written to a temporary file in the output directory and
//! renamed into place once complete.

use crate::{Error, Result};
use gammasep_analysis::{AccumulatorConfig, AnalysisResult, ThresholdGrid};
use gammasep_analysis::{DerivedCurve, RunStatistics};
use gammasep_core::Histogram;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Structured results file name.
pub const RESULTS_JSON: &str = "histograms_all.json";
/// Histogram table file name.
pub const HISTOGRAMS_CSV: &str = "histograms.csv";
/// Curve table file name.
pub const CURVES_CSV: &str = "curves.csv";

/// Description of the run stored alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Input hit file.
    pub input: String,
    /// Emission energy label given on the command line (informational only).
    pub emission_energy_label: String,
    /// Accumulation settings.
    pub accumulator: AccumulatorConfig,
    /// Threshold sweep settings.
    pub threshold_grid: ThresholdGrid,
    /// Version of the producing tool.
    pub tool_version: String,
}

#[derive(Serialize)]
struct ResultsDocument<'a> {
    metadata: &'a RunMetadata,
    statistics: &'a RunStatistics,
    histograms: [&'a Histogram; 5],
    curves: [&'a DerivedCurve; 6],
}

/// Writer for the result files of one run.
pub struct ResultsWriter {
    dir: PathBuf,
}

impl ResultsWriter {
    /// Creates a writer, creating `dir` if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes all histograms and curves as one JSON document.
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub fn write_json(&self, result: &AnalysisResult, metadata: &RunMetadata) -> Result<PathBuf> {
        let document = ResultsDocument {
            metadata,
            statistics: &result.statistics,
            histograms: result.histograms.all(),
            curves: result.curves.all(),
        };
        self.write_atomically(RESULTS_JSON, |w| {
            serde_json::to_writer_pretty(&mut *w, &document)?;
            writeln!(w)?;
            Ok(())
        })
    }

    /// Writes the histogram and curve tables as CSV.
    ///
    /// # Errors
    /// Returns an error if a file write fails.
    pub fn write_csv(&self, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
        let histograms = result.histograms.all();
        let hist_path = self.write_atomically(HISTOGRAMS_CSV, |w| {
            let names: Vec<&str> = histograms.iter().map(|h| h.name()).collect();
            writeln!(w, "bin,low_edge_kev,center_kev,{}", names.join(","))?;

            let reference = histograms[0];
            for bin in 1..=reference.spec().bins {
                write!(
                    w,
                    "{},{},{}",
                    bin,
                    reference.bin_low_edge(bin),
                    reference.bin_center(bin)
                )?;
                for h in &histograms {
                    write!(w, ",{}", h.get(bin).unwrap_or(0))?;
                }
                writeln!(w)?;
            }
            Ok(())
        })?;

        let c = &result.curves;
        let curve_path = self.write_atomically(CURVES_CSV, |w| {
            writeln!(
                w,
                "threshold_kev,purity_prompt,efficiency_prompt,fpr_prompt,purity_511,efficiency_511,fpr_511"
            )?;
            for (i, &(threshold, purity_prompt)) in c.purity_prompt.points.iter().enumerate() {
                let y = |curve: &DerivedCurve| curve.y(i).unwrap_or(0.0);
                let fpr = |curve: &DerivedCurve| curve.points.get(i).map_or(0.0, |p| p.1);
                writeln!(
                    w,
                    "{},{},{},{},{},{},{}",
                    threshold,
                    purity_prompt,
                    y(&c.efficiency_prompt),
                    fpr(&c.roc_prompt),
                    y(&c.purity_511),
                    y(&c.efficiency_511),
                    fpr(&c.roc_511)
                )?;
            }
            Ok(())
        })?;

        Ok(vec![hist_path, curve_path])
    }

    fn write_atomically<F>(&self, file_name: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let target = self.dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            write(&mut writer)?;
            writer.flush()?;
        }
        tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
        info!("wrote {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammasep_analysis::process_records;
    use gammasep_core::{HitRecord, Position};
    use tempfile::TempDir;

    fn result() -> AnalysisResult {
        let hits = [
            HitRecord::new(0, 1, 600.0, 1157.0, Position::default()),
            HitRecord::new(0, 2, 500.0, 511.0, Position::default()),
            HitRecord::new(1, 3, 300.0, 511.0, Position::default()),
        ];
        process_records(hits, &AccumulatorConfig::default(), ThresholdGrid::default()).unwrap()
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            input: "hits.txt".into(),
            emission_energy_label: "1157".into(),
            accumulator: AccumulatorConfig::default(),
            threshold_grid: ThresholdGrid::default(),
            tool_version: "test".into(),
        }
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let writer = ResultsWriter::create(dir.path().join("out")).unwrap();
        let path = writer.write_json(&result(), &metadata()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["histograms"].as_array().unwrap().len(), 5);
        assert_eq!(value["curves"].as_array().unwrap().len(), 6);
        assert_eq!(value["histograms"][0]["name"], "all_prompt");
        assert_eq!(value["histograms"][1]["entries"], 2);
        assert_eq!(value["curves"][2]["name"], "roc_prompt");
        assert_eq!(
            value["curves"][0]["points"].as_array().unwrap().len(),
            1158
        );
        assert_eq!(value["statistics"]["events"], 2);
        assert_eq!(value["metadata"]["emission_energy_label"], "1157");

        let metadata: RunMetadata = serde_json::from_value(value["metadata"].clone()).unwrap();
        assert_eq!(metadata, self::metadata());
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let writer = ResultsWriter::create(dir.path()).unwrap();
        let paths = writer.write_csv(&result()).unwrap();
        assert_eq!(paths.len(), 2);

        let hist = fs::read_to_string(&paths[0]).unwrap();
        let mut lines = hist.lines();
        assert_eq!(
            lines.next().unwrap(),
            "bin,low_edge_kev,center_kev,all_prompt,all_511,prompt_3det,prompt_det_gamma1,prompt_det_gamma2"
        );
        assert_eq!(lines.count(), 500);
        // 600 keV lands in bin 251 of the all-prompt column.
        assert!(hist.lines().any(|l| l.starts_with("251,") && l.split(',').nth(3) == Some("1")));

        let curves = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(curves.lines().count(), 1159);
        assert!(curves.lines().nth(1).unwrap().starts_with("0,"));
    }

    #[test]
    fn test_no_temporary_files_left() {
        let dir = TempDir::new().unwrap();
        let writer = ResultsWriter::create(dir.path()).unwrap();
        writer.write_json(&result(), &metadata()).unwrap();
        writer.write_csv(&result()).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![CURVES_CSV, HISTOGRAMS_CSV, RESULTS_JSON]);
    }
}
