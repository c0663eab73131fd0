//! Aria Metrics - Training-performance metrics for head-worn camera recordings
//!
//! Turns the head-pose samples extracted from a recording (plus optional heart
//! rate, hand tracking, and eye gaze) into a deterministic set of metrics:
//! session validation → motion → stability → stress → composite score → report.
//!
//! ```ignore
//! let calculator = MetricsCalculator::with_defaults();
//! let recording = RecordingAdapter::parse_recording(&json)?;
//! let analysis = calculator.calculate_recording(&recording)?;
//! let report = ReportEncoder::new().encode_recording(&recording, &analysis);
//! ```

pub mod adapter;
pub mod batch;
pub mod calculator;
pub mod config;
pub mod error;
pub mod geometry;
pub mod motion;
pub mod performance;
pub mod report;
pub mod session;
pub mod signal;
pub mod stability;
pub mod stress;
pub mod tracking;
pub mod types;

pub use adapter::{Recording, RecordingAdapter, ValidationReport};
pub use batch::{analyze_batch, BatchEntry, BatchInput, BatchOutcome, BatchSummary};
pub use calculator::MetricsCalculator;
pub use config::MetricsConfig;
pub use error::AnalysisError;
pub use geometry::Quaternion;
pub use report::{render_text, ReportEncoder, SessionReport};
pub use session::Session;
pub use types::{MetricSet, MetricValue, PerformanceRating, Sample, SessionAnalysis};

/// Crate version embedded in every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "aria-metrics";
