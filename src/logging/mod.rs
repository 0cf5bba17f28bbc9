// SPDX-License-Identifier: Apache-2.0 OR MIT
// Lock-free log pipeline
//
// Producers build a `LogRecord` (template + tagged arguments + call site),
// move it into the MPSC ring and return immediately. A single background
// consumer renders records into bounded lines and writes them to a sink.

mod consumer;
mod facility;
mod format;
mod logger;
#[macro_use]
mod macros;
pub mod pipeline;
mod record;
mod ring;
mod severity;

// Public exports
pub use consumer::{AsyncConsumer, BlockingConsumer, FileSink, LogSink, StderrSink, StdoutSink};
pub use facility::Facility;
pub use format::{render, BoundedBuf, LogFormat, LOG_MAX_RECORD};
pub use logger::{LogLevels, Logger};
pub use pipeline::LogPipeline;
pub use record::{ArgStr, ArgTag, LogArg, LogRecord, MAX_LOG_ARGS, MAX_STR_ARG};
pub use ring::{MpscRing, RingFull};
pub use severity::Severity;
