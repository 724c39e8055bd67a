#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use gammasep_analysis::{process_hits, AccumulatorConfig, ThresholdGrid};
use gammasep_core::{HitRecord, Position};
use gammasep_io::{encode_record, Error, HitFileFormat, HitFileReader, ResultsWriter, RunMetadata};
use std::io::Write;
use tempfile::{Builder, TempDir};

fn hits() -> Vec<HitRecord> {
    vec![
        HitRecord::new(10, 1, 980.0, 1157.0, Position::new(0.0, 1.0, 2.0)),
        HitRecord::new(10, 2, 511.0, 511.0, Position::new(0.0, -1.0, 2.0)),
        HitRecord::new(10, 3, 200.0, 511.0, Position::new(1.0, -1.0, 2.0)),
        HitRecord::new(11, 1, 350.0, 1157.0, Position::new(0.0, 1.0, 0.0)),
        HitRecord::new(11, 9, 12.0, 0.0, Position::new(0.0, 0.0, 0.0)),
        HitRecord::new(12, 3, 430.0, 511.0, Position::new(5.0, 5.0, 5.0)),
    ]
}

#[test]
fn test_binary_file_pipeline() {
    let mut file = Builder::new().suffix(".bin").tempfile().unwrap();
    for hit in hits() {
        file.write_all(&encode_record(&hit)).unwrap();
    }
    file.flush().unwrap();

    let reader = HitFileReader::open(file.path()).unwrap();
    assert_eq!(reader.format(), HitFileFormat::Binary);
    assert_eq!(reader.record_count(), Some(6));

    let result = process_hits(reader, &AccumulatorConfig::default(), ThresholdGrid::default())
        .unwrap();
    assert_eq!(result.statistics.hits_read, 6);
    assert_eq!(result.statistics.hits_ignored, 1);
    assert_eq!(result.statistics.events, 3);
    assert_eq!(result.histograms.all_prompt.entries(), 2);
    assert_eq!(result.histograms.all_511.entries(), 3);
    assert_eq!(result.histograms.prompt_3det.entries(), 1);
    assert_relative_eq!(result.curves.efficiency_prompt.y(0).unwrap(), 1.0);
}

#[test]
fn test_text_and_binary_agree() {
    let mut text = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(text, "# event,track,edep,emission,x,y,z").unwrap();
    for h in hits() {
        writeln!(
            text,
            "{},{},{},{},{},{},{}",
            h.event_id,
            h.track_id,
            h.deposited_energy,
            h.emission_energy,
            h.position.x,
            h.position.y,
            h.position.z
        )
        .unwrap();
    }
    text.flush().unwrap();

    let mut binary = Builder::new().suffix(".dat").tempfile().unwrap();
    for hit in hits() {
        binary.write_all(&encode_record(&hit)).unwrap();
    }
    binary.flush().unwrap();

    let from_text: Vec<HitRecord> = HitFileReader::open(text.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let from_binary: Vec<HitRecord> = HitFileReader::open(binary.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(from_text, hits());
    assert_eq!(from_binary, hits());
}

#[test]
fn test_invariant_violation_surfaces_as_core_error() {
    let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "1 1 300 1157 0 0 0").unwrap();
    writeln!(file, "1 2 300 1157 0 0 0").unwrap();
    file.flush().unwrap();

    let reader = HitFileReader::open(file.path()).unwrap();
    let err = process_hits(reader, &AccumulatorConfig::default(), ThresholdGrid::default())
        .unwrap_err();
    match err {
        Error::CoreError(core) => assert!(core.is_invariant_violation()),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_forced_text_format_on_binary_extension() {
    let mut file = Builder::new().suffix(".bin").tempfile().unwrap();
    writeln!(file, "3 1 700 1157 0 0 0").unwrap();
    file.flush().unwrap();

    let records: Vec<HitRecord> = HitFileReader::open_with_format(file.path(), HitFileFormat::Text)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_id, 3);
}

#[test]
fn test_nothing_written_when_processing_fails() {
    let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "1 1 300 1157 0 0 0").unwrap();
    writeln!(file, "broken line").unwrap();
    file.flush().unwrap();

    let out = TempDir::new().unwrap();
    let run = || -> gammasep_io::Result<()> {
        let reader = HitFileReader::open(file.path())?;
        let result = process_hits(reader, &AccumulatorConfig::default(), ThresholdGrid::default())?;
        let writer = ResultsWriter::create(out.path())?;
        let metadata = RunMetadata {
            input: file.path().display().to_string(),
            emission_energy_label: "1157".into(),
            accumulator: AccumulatorConfig::default(),
            threshold_grid: ThresholdGrid::default(),
            tool_version: "test".into(),
        };
        writer.write_json(&result, &metadata)?;
        Ok(())
    };

    assert!(matches!(run(), Err(Error::Parse { line: 2, .. })));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
