//! Hit record readers.
//!
//! Two on-disk layouts are understood:
//!
//! - **binary**: little-endian fixed-size records of [`RECORD_SIZE`] bytes,
//!   `event_id: i32, track_id: i32, deposited: f64, emission: f64, x: f64,
//!   y: f64, z: f64`, read through a memory map.
//! - **text**: one record per line with the same seven fields separated by
//!   whitespace or commas; blank lines and `#` comments are skipped.

use crate::{Error, Result};
use gammasep_core::{HitRecord, Position};
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Size of one binary hit record in bytes.
pub const RECORD_SIZE: usize = 48;

const TEXT_FIELDS: usize = 7;

/// On-disk layout of a hit file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitFileFormat {
    /// Binary for `.bin`/`.dat`, text otherwise.
    #[default]
    Auto,
    /// Fixed-size little-endian records.
    Binary,
    /// Whitespace or comma separated columns.
    Text,
}

impl HitFileFormat {
    /// Resolves `Auto` from the file extension.
    #[must_use]
    pub fn resolve(self, path: &Path) -> Self {
        match self {
            Self::Auto => {
                let ext = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_ascii_lowercase);
                match ext.as_deref() {
                    Some("bin" | "dat") => Self::Binary,
                    _ => Self::Text,
                }
            }
            other => other,
        }
    }
}

/// A memory-mapped file reader.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns [`Error::Open`] if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self { mmap, path })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the mapping was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

/// Decodes one binary record.
///
/// # Panics
/// Panics if `bytes` is shorter than [`RECORD_SIZE`].
#[must_use]
pub fn decode_record(bytes: &[u8]) -> HitRecord {
    let f = |offset| f64::from_le_bytes(field(bytes, offset));
    HitRecord {
        event_id: i32::from_le_bytes(field(bytes, 0)),
        track_id: i32::from_le_bytes(field(bytes, 4)),
        deposited_energy: f(8),
        emission_energy: f(16),
        position: Position::new(f(24), f(32), f(40)),
    }
}

/// Encodes one binary record.
#[must_use]
pub fn encode_record(hit: &HitRecord) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    out[0..4].copy_from_slice(&hit.event_id.to_le_bytes());
    out[4..8].copy_from_slice(&hit.track_id.to_le_bytes());
    let floats = [
        hit.deposited_energy,
        hit.emission_energy,
        hit.position.x,
        hit.position.y,
        hit.position.z,
    ];
    for (i, value) in floats.iter().enumerate() {
        let start = 8 + i * 8;
        out[start..start + 8].copy_from_slice(&value.to_le_bytes());
    }
    out
}

fn parse_line(line: &str, line_no: usize) -> Result<Option<HitRecord>> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = content
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if fields.len() != TEXT_FIELDS {
        return Err(Error::Parse {
            line: line_no,
            message: format!("expected {TEXT_FIELDS} fields, found {}", fields.len()),
        });
    }

    let int = |i: usize, name: &str| {
        fields[i].parse::<i32>().map_err(|e| Error::Parse {
            line: line_no,
            message: format!("{name} '{}': {e}", fields[i]),
        })
    };
    let float = |i: usize, name: &str| {
        fields[i].parse::<f64>().map_err(|e| Error::Parse {
            line: line_no,
            message: format!("{name} '{}': {e}", fields[i]),
        })
    };

    Ok(Some(HitRecord {
        event_id: int(0, "event id")?,
        track_id: int(1, "track id")?,
        deposited_energy: float(2, "deposited energy")?,
        emission_energy: float(3, "emission energy")?,
        position: Position::new(float(4, "x")?, float(5, "y")?, float(6, "z")?),
    }))
}

enum Records {
    Binary {
        reader: MappedFileReader,
        offset: usize,
    },
    Text {
        lines: Lines<BufReader<File>>,
        line_no: usize,
    },
}

/// Sequential hit record source.
///
/// Yields records in file order. Iteration stops after the first error.
pub struct HitFileReader {
    records: Records,
    path: PathBuf,
    format: HitFileFormat,
    failed: bool,
}

impl HitFileReader {
    /// Opens a hit file, picking the format from its extension.
    ///
    /// # Errors
    /// Returns [`Error::Open`] if the path is a directory or cannot be opened, or
    /// [`Error::InvalidFormat`] for a truncated binary file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_format(path, HitFileFormat::Auto)
    }

    /// Opens a hit file with an explicit format.
    ///
    /// # Errors
    /// Returns [`Error::Open`] if the path is a directory or cannot be opened, or
    /// [`Error::InvalidFormat`] for a truncated binary file.
    pub fn open_with_format<P: AsRef<Path>>(path: P, format: HitFileFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = format.resolve(&path);
        if path.is_dir() {
            return Err(Error::Open {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
            });
        }

        let records = match format {
            HitFileFormat::Binary => {
                let reader = MappedFileReader::open(&path)?;
                if reader.len() % RECORD_SIZE != 0 {
                    return Err(Error::InvalidFormat(format!(
                        "file size {} is not a multiple of {RECORD_SIZE} (file: {})",
                        reader.len(),
                        path.display()
                    )));
                }
                debug!(
                    "{}: {} binary records",
                    path.display(),
                    reader.len() / RECORD_SIZE
                );
                Records::Binary { reader, offset: 0 }
            }
            HitFileFormat::Text | HitFileFormat::Auto => {
                let file = File::open(&path).map_err(|source| Error::Open {
                    path: path.clone(),
                    source,
                })?;
                Records::Text {
                    lines: BufReader::new(file).lines(),
                    line_no: 0,
                }
            }
        };

        Ok(Self {
            records,
            path,
            format,
            failed: false,
        })
    }

    /// Number of records for binary files; `None` for text.
    #[must_use]
    pub fn record_count(&self) -> Option<usize> {
        match &self.records {
            Records::Binary { reader, .. } => Some(reader.len() / RECORD_SIZE),
            Records::Text { .. } => None,
        }
    }

    /// Resolved format.
    #[must_use]
    pub fn format(&self) -> HitFileFormat {
        self.format
    }

    /// Source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_record(&mut self) -> Option<Result<HitRecord>> {
        match &mut self.records {
            Records::Binary { reader, offset } => {
                let bytes = reader.as_bytes().get(*offset..*offset + RECORD_SIZE)?;
                *offset += RECORD_SIZE;
                Some(Ok(decode_record(bytes)))
            }
            Records::Text { lines, line_no } => loop {
                let line = match lines.next()? {
                    Ok(line) => line,
                    Err(e) => return Some(Err(e.into())),
                };
                *line_no += 1;
                match parse_line(&line, *line_no) {
                    Ok(Some(hit)) => return Some(Ok(hit)),
                    Ok(None) => {}
                    Err(e) => return Some(Err(e)),
                }
            },
        }
    }
}

impl Iterator for HitFileReader {
    type Item = Result<HitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_record();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn sample() -> HitRecord {
        HitRecord::new(12, 2, 341.5, 511.0, Position::new(-1.5, 20.25, 3.0))
    }

    #[test]
    fn test_record_layout() {
        let bytes = encode_record(&sample());
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(&bytes[0..4], &12i32.to_le_bytes());
        assert_eq!(&bytes[16..24], &511.0f64.to_le_bytes());
        assert_eq!(decode_record(&bytes), sample());
    }

    #[test]
    fn test_format_resolution() {
        let auto = HitFileFormat::Auto;
        assert_eq!(auto.resolve(Path::new("a.bin")), HitFileFormat::Binary);
        assert_eq!(auto.resolve(Path::new("a.DAT")), HitFileFormat::Binary);
        assert_eq!(auto.resolve(Path::new("a.txt")), HitFileFormat::Text);
        assert_eq!(auto.resolve(Path::new("hits")), HitFileFormat::Text);
        assert_eq!(
            HitFileFormat::Binary.resolve(Path::new("a.csv")),
            HitFileFormat::Binary
        );
    }

    #[test]
    fn test_parse_line() {
        let hit = parse_line("12, 2, 341.5, 511, -1.5, 20.25, 3", 1).unwrap().unwrap();
        assert_eq!(hit, sample());
        let hit = parse_line("12 2 341.5 511 -1.5 20.25 3 # trailing", 1)
            .unwrap()
            .unwrap();
        assert_eq!(hit, sample());
        assert!(parse_line("   # comment only", 1).unwrap().is_none());
        assert!(parse_line("", 1).unwrap().is_none());
    }

    #[test]
    fn test_parse_line_errors() {
        match parse_line("1 2 3", 4) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_line("1 x 3 4 5 6 7", 9),
            Err(Error::Parse { line: 9, .. })
        ));
    }

    #[test]
    fn test_mapped_file_reader() {
        let mut file = Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&encode_record(&sample())).unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), RECORD_SIZE);
        assert!(!reader.is_empty());
    }

    #[test]
    fn test_directory_is_open_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let hits = dir.path().join("hits.txt");
        std::fs::create_dir(&hits).unwrap();

        for format in [HitFileFormat::Auto, HitFileFormat::Text, HitFileFormat::Binary] {
            match HitFileReader::open_with_format(&hits, format) {
                Err(Error::Open { path, .. }) => assert_eq!(path, hits),
                Err(other) => panic!("unexpected error {other}"),
                Ok(_) => panic!("opened a directory as {format:?}"),
            }
        }
    }

    #[test]
    fn test_binary_truncated() {
        let mut file = Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&[0u8; RECORD_SIZE + 3]).unwrap();
        file.flush().unwrap();
        assert!(matches!(
            HitFileReader::open(file.path()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_text_reader_stops_after_error() {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "# event track edep emission x y z").unwrap();
        writeln!(file, "1 1 300 1157 0 0 0").unwrap();
        writeln!(file, "1 1 oops 1157 0 0 0").unwrap();
        writeln!(file, "2 2 100 511 0 0 0").unwrap();
        file.flush().unwrap();

        let mut reader = HitFileReader::open(file.path()).unwrap();
        assert_eq!(reader.format(), HitFileFormat::Text);
        assert!(reader.record_count().is_none());
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(Error::Parse { line: 3, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = HitFileReader::open("/nonexistent/definitely/missing.txt").err();
        assert!(matches!(err, Some(Error::Open { .. })));
    }
}
