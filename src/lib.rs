// Library interface for egoplot
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod errors;
pub mod extractor;
pub mod plot;
pub mod scenario;
pub mod tfrecord;
pub mod trajectory;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::EgoPlotError;
pub use extractor::{RunOptions, RunReport, ScenarioOutcome, extract_and_plot};
pub use plot::{PlotConfig, TrajectoryPlotter};
pub use scenario::{ObjectState, ObjectType, Scenario, Track};
pub use tfrecord::{Compression, RecordReader, RecordWriter};
pub use trajectory::{EgoTrajectory, Extraction, Point2D};
pub use writer::{MemorySink, PlotSink, SvgFileSink};
