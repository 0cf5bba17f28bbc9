// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Log pipeline wiring
//!
//! Builds the ring, the shared level table and the sink from configuration,
//! and runs the single consumer on a dedicated thread for the lifetime of the
//! pipeline.

use super::consumer::{BlockingConsumer, FileSink, LogSink, StderrSink, StdoutSink};
use super::format::LogFormat;
use super::logger::{LogLevels, Logger};
use super::ring::MpscRing;
use crate::config::{LogConfig, SinkConfig};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// A running log pipeline: producers hold `Logger` clones, one thread drains
pub struct LogPipeline {
    logger: Logger,
    consumer_handle: Option<JoinHandle<()>>,
    consumer_stop: Arc<AtomicBool>,
}

impl LogPipeline {
    /// Start a pipeline as described by the `log` config section
    pub fn start(config: &LogConfig) -> io::Result<Self> {
        let sink: Box<dyn LogSink> = match &config.sink {
            SinkConfig::Stderr => Box::new(StderrSink::new()),
            SinkConfig::Stdout => Box::new(StdoutSink::new()),
            SinkConfig::File(path) => Box::new(FileSink::open(path)?),
        };

        let levels = LogLevels::new(config.level);
        for (facility, level) in &config.facility_levels {
            levels.set_facility(*facility, *level);
        }

        Self::with_sink(
            config.ring_capacity,
            levels,
            sink,
            config.format,
            Duration::from_millis(config.idle_ms),
        )
    }

    /// Start a pipeline around an explicit sink
    pub fn with_sink(
        capacity: usize,
        levels: LogLevels,
        sink: Box<dyn LogSink>,
        format: LogFormat,
        idle: Duration,
    ) -> io::Result<Self> {
        let ring = Arc::new(MpscRing::new(capacity));
        let logger = Logger::new(Arc::clone(&ring), Arc::new(levels));

        let consumer = BlockingConsumer::new(ring, sink, format).with_idle(idle);
        let consumer_stop = consumer.stop_handle();
        let consumer_handle = std::thread::Builder::new()
            .name("log-consumer".to_string())
            .spawn(move || consumer.run())?;

        Ok(Self {
            logger,
            consumer_handle: Some(consumer_handle),
            consumer_stop,
        })
    }

    /// Get a logger handle (cheap clone)
    pub fn logger(&self) -> Logger {
        self.logger.clone()
    }

    /// Stop the consumer after it drains the ring, and join it
    pub fn shutdown(mut self) {
        self.stop_consumer();
    }

    fn stop_consumer(&mut self) {
        self.consumer_stop.store(false, Ordering::Relaxed);
        if let Some(handle) = self.consumer_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LogPipeline {
    fn drop(&mut self) {
        self.stop_consumer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::consumer::tests::CaptureSink;
    use crate::logging::{Facility, Severity};
    use crate::{log_debug, log_info};

    #[test]
    fn test_pipeline_delivers_in_order() {
        let (sink, lines) = CaptureSink::new();
        let pipeline = LogPipeline::with_sink(
            64,
            LogLevels::new(Severity::Info),
            Box::new(sink),
            LogFormat::Text,
            Duration::from_millis(1),
        )
        .unwrap();
        let logger = pipeline.logger();

        for i in 0..10u32 {
            log_info!(logger, Facility::Test, "message {}", i);
        }
        log_debug!(logger, Facility::Test, "filtered");
        pipeline.shutdown();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 10);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.ends_with(&format!("message {}", i)), "line {}: {}", i, line);
        }
    }

    #[test]
    fn test_start_from_config_with_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.log");
        let config = LogConfig {
            sink: SinkConfig::File(path.clone()),
            format: LogFormat::Json,
            ..LogConfig::default()
        };

        let pipeline = LogPipeline::start(&config).unwrap();
        let logger = pipeline.logger();
        assert_eq!(logger.ring_capacity(), config.ring_capacity);
        log_info!(logger, Facility::Main, "hello {}", "file");
        drop(pipeline);

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["message"], "hello file");
        assert_eq!(value["facility"], "Main");
    }
}
