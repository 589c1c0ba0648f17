//! Structured log pipeline for reqlog services.
//!
//! Every `tracing` event is turned into a [`LogRecord`], passed through the
//! registered [`RecordProcessor`]s and written as one JSON object per line.

pub mod config;
pub mod init;
pub mod record;
pub mod sink;
pub mod spans;

pub use config::{LogFormat, TracingConfig};
pub use init::{init_tracing, LogPipeline};
pub use record::LogRecord;
pub use sink::{JsonSink, ProcessorChain, RecordProcessor};
