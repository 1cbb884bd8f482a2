// Error types for egoplot

use snafu::Snafu;
use std::{io, path::PathBuf};

#[derive(Debug, Snafu)]
pub enum EgoPlotError {
    // Configuration errors
    #[snafu(display("Scenario file not found: {}", path.display()))]
    MissingScenarioFile { path: PathBuf },
    #[snafu(display("Unable to open scenario file {}", path.display()))]
    ScenarioFileOpen { path: PathBuf, source: io::Error },
    #[snafu(display("Scenario limit must be at least 1"))]
    InvalidScenarioLimit,
    #[snafu(display("Error reading config file {}", path.display()))]
    ConfigIOError { path: PathBuf, source: io::Error },
    #[snafu(display("Error parsing config file {}", path.display()))]
    ConfigParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    // Record container errors
    #[snafu(display("Error reading record {record_no}"))]
    RecordRead { record_no: usize, source: io::Error },
    #[snafu(display("Record {record_no} is truncated: {reason}"))]
    TruncatedRecord { record_no: usize, reason: String },
    #[snafu(display(
        "Checksum mismatch in {part} of record {record_no}: expected {expected:#010x}, found {actual:#010x}"
    ))]
    ChecksumMismatch {
        record_no: usize,
        part: &'static str,
        expected: u32,
        actual: u32,
    },
    #[snafu(display("Record {record_no} declares a length of {length} bytes, max {max}"))]
    RecordTooLarge {
        record_no: usize,
        length: u64,
        max: u64,
    },
    #[snafu(display("Error writing record"))]
    RecordWrite { source: io::Error },

    // Schema errors
    #[snafu(display("Unable to decode scenario from record {record_no}"))]
    ScenarioDecode {
        record_no: usize,
        source: prost::DecodeError,
    },
    #[snafu(display(
        "Ego track index {index} is out of range for scenario {scenario_id} with {track_count} tracks"
    ))]
    EgoTrackIndexOutOfRange {
        scenario_id: String,
        index: i64,
        track_count: usize,
    },

    // Rendering and output errors
    #[snafu(display("Plot rendering failed: {reason}"))]
    PlotRenderError { reason: String },
    #[snafu(display("Error writing plot file {}", path.display()))]
    PlotWriteError { path: PathBuf, source: io::Error },
    #[snafu(display("Error writing run summary"))]
    ConsoleWriteError { source: io::Error },
}
