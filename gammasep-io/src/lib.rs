//! gammasep-io: Input and output for gammasep.
//!
//! This crate provides the hit record reader (memory-mapped binary or
//! text), the structured results writer, and chart rendering.
//!

mod error;
mod reader;
#[cfg(feature = "plot")]
pub mod render;
mod writer;

pub use error::{Error, Result};
pub use reader::{
    decode_record, encode_record, HitFileFormat, HitFileReader, MappedFileReader, RECORD_SIZE,
};
#[cfg(feature = "plot")]
pub use render::ChartRenderer;
pub use writer::{ResultsWriter, RunMetadata};
