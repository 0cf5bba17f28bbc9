// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log consumer - drains the ring, renders records and writes them to a sink

use super::format::{render, LogFormat};
use super::ring::MpscRing;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default idle pause between polls of an empty ring
pub const DEFAULT_IDLE: Duration = Duration::from_millis(1);

/// Output sink for rendered log lines
pub trait LogSink: Send {
    /// Write one rendered record (without trailing newline)
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&mut self) -> io::Result<()>;
}

/// Standard error sink (the default)
pub struct StderrSink {
    stderr: io::Stderr,
}

impl StderrSink {
    pub fn new() -> Self {
        Self {
            stderr: io::stderr(),
        }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StderrSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stderr, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stderr.flush()
    }
}

/// Standard output sink
pub struct StdoutSink {
    stdout: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.stdout, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

/// Append-only file sink
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// The drain step shared by both consumer flavours
struct Drainer {
    ring: Arc<MpscRing>,
    sink: Box<dyn LogSink>,
    format: LogFormat,
}

impl Drainer {
    /// Render and write everything currently available; returns the count
    fn drain(&mut self) -> usize {
        let mut written = 0;
        while let Some(record) = self.ring.pop() {
            let line = render(&record, self.format);
            if self.sink.write_line(&line).is_err() {
                // Last resort: the sink is broken, fall back to stderr
                let _ = writeln!(io::stderr(), "{}", line);
            }
            written += 1;
        }
        if written > 0 {
            let _ = self.sink.flush();
        }
        written
    }
}

/// Consumer that runs on a dedicated OS thread
pub struct BlockingConsumer {
    drainer: Drainer,
    idle: Duration,
    running: Arc<AtomicBool>,
}

impl BlockingConsumer {
    /// Create a consumer for `ring`
    ///
    /// The ring must have no other consumer.
    pub fn new(ring: Arc<MpscRing>, sink: Box<dyn LogSink>, format: LogFormat) -> Self {
        Self {
            drainer: Drainer { ring, sink, format },
            idle: DEFAULT_IDLE,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a consumer that writes to stderr
    pub fn stderr(ring: Arc<MpscRing>) -> Self {
        Self::new(ring, Box::new(StderrSink::new()), LogFormat::Text)
    }

    /// Set the pause taken when the ring is empty
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Get a handle to stop the consumer
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Drain once without blocking
    pub fn drain(&mut self) -> usize {
        self.drainer.drain()
    }

    /// Run the consumer loop (blocks until stopped)
    ///
    /// Records still queued when the stop flag is observed are drained
    /// before returning.
    pub fn run(mut self) {
        while self.running.load(Ordering::Relaxed) {
            if self.drainer.drain() == 0 {
                std::thread::sleep(self.idle);
            }
        }
        self.drainer.drain();
        let _ = self.drainer.sink.flush();
    }
}

/// Consumer that runs as a tokio task
pub struct AsyncConsumer {
    drainer: Drainer,
    idle: Duration,
    running: Arc<AtomicBool>,
}

impl AsyncConsumer {
    pub fn new(ring: Arc<MpscRing>, sink: Box<dyn LogSink>, format: LogFormat) -> Self {
        Self {
            drainer: Drainer { ring, sink, format },
            idle: DEFAULT_IDLE,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run the consumer task (returns once stopped and drained)
    pub async fn run(mut self) {
        while self.running.load(Ordering::Relaxed) {
            if self.drainer.drain() == 0 {
                tokio::time::sleep(self.idle).await;
            }
        }
        self.drainer.drain();
        let _ = self.drainer.sink.flush();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logging::{Facility, LogRecord, Severity};
    use std::sync::Mutex;

    /// Test sink that captures lines
    pub(crate) struct CaptureSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl CaptureSink {
        pub(crate) fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let lines = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    lines: Arc::clone(&lines),
                },
                lines,
            )
        }
    }

    impl LogSink for CaptureSink {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write_line(&mut self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn push(ring: &MpscRing, severity: Severity, message: &'static str) {
        ring.push(LogRecord::new(severity, Facility::Test, message).at("t.rs", 1))
            .unwrap();
    }

    #[tokio::test]
    async fn test_async_consumer() {
        let ring = Arc::new(MpscRing::new(16));
        let (sink, lines) = CaptureSink::new();

        push(&ring, Severity::Info, "Message 1");
        push(&ring, Severity::Error, "Message 2");

        let consumer = AsyncConsumer::new(Arc::clone(&ring), Box::new(sink), LogFormat::Text);
        let stop = consumer.stop_handle();
        let handle = tokio::spawn(consumer.run());

        tokio::time::sleep(Duration::from_millis(10)).await;
        stop.store(false, Ordering::Relaxed);
        handle.await.unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(
            *lines,
            vec![
                "[INFO] [Test] t.rs:1: Message 1".to_string(),
                "[ERROR] [Test] t.rs:1: Message 2".to_string(),
            ]
        );
        assert!(ring.is_empty());
    }

    #[test]
    fn test_blocking_consumer() {
        let ring = Arc::new(MpscRing::new(16));
        let (sink, lines) = CaptureSink::new();

        push(&ring, Severity::Info, "Message 1");
        push(&ring, Severity::Error, "Message 2");

        let consumer = BlockingConsumer::new(Arc::clone(&ring), Box::new(sink), LogFormat::Text);
        let stop = consumer.stop_handle();
        let handle = std::thread::spawn(move || consumer.run());

        std::thread::sleep(Duration::from_millis(10));
        stop.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Message 1"));
        assert!(lines[1].contains("Message 2"));
    }

    #[test]
    fn test_stop_drains_remaining_records() {
        let ring = Arc::new(MpscRing::new(16));
        let (sink, lines) = CaptureSink::new();
        let consumer = BlockingConsumer::new(Arc::clone(&ring), Box::new(sink), LogFormat::Text)
            .with_idle(Duration::from_millis(50));

        // Stop before the loop ever runs: the final drain must still happen
        consumer.stop_handle().store(false, Ordering::Relaxed);
        push(&ring, Severity::Warn, "late");
        consumer.run();

        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_broken_sink_still_consumes() {
        let ring = Arc::new(MpscRing::new(4));
        push(&ring, Severity::Info, "goes to stderr");

        let mut consumer = BlockingConsumer::new(Arc::clone(&ring), Box::new(BrokenSink), LogFormat::Text);
        assert_eq!(consumer.drain(), 1);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cozmonaut.log");

        let ring = Arc::new(MpscRing::new(4));
        push(&ring, Severity::Info, "to file");
        let sink = FileSink::open(&path).unwrap();
        let mut consumer = BlockingConsumer::new(Arc::clone(&ring), Box::new(sink), LogFormat::Text);
        consumer.drain();
        drop(consumer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[INFO] [Test] t.rs:1: to file\n");
    }
}
