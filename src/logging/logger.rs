// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logger handle and shared severity filtering

use super::record::{LogArg, LogRecord};
use super::ring::{MpscRing, RingFull};
use super::{Facility, Severity};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Severity thresholds shared by every clone of a logger
///
/// A facility-specific level, when set, overrides the global one.
#[derive(Debug)]
pub struct LogLevels {
    global_min_level: AtomicU8,
    facility_min_levels: RwLock<HashMap<Facility, Severity>>,
}

impl LogLevels {
    pub fn new(global: Severity) -> Self {
        Self {
            global_min_level: AtomicU8::new(global as u8),
            facility_min_levels: RwLock::new(HashMap::new()),
        }
    }

    /// Check if a record at `severity` from `facility` should be written
    #[inline]
    pub fn enabled(&self, severity: Severity, facility: Facility) -> bool {
        let levels = self
            .facility_min_levels
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(&min_level) = levels.get(&facility) {
            return severity <= min_level;
        }
        drop(levels); // Release lock before atomic load

        severity.as_u8() <= self.global_min_level.load(Ordering::Relaxed)
    }

    pub fn set_global(&self, level: Severity) {
        self.global_min_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn global(&self) -> Severity {
        let level = self.global_min_level.load(Ordering::Relaxed);
        Severity::from_u8(level).unwrap_or(Severity::Info)
    }

    pub fn set_facility(&self, facility: Facility, level: Severity) {
        self.facility_min_levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(facility, level);
    }

    pub fn clear_facility(&self, facility: Facility) {
        self.facility_min_levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&facility);
    }

    /// Effective level for a facility (override or global)
    pub fn facility(&self, facility: Facility) -> Severity {
        self.facility_min_levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&facility)
            .copied()
            .unwrap_or_else(|| self.global())
    }
}

impl Default for LogLevels {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

/// Logger handle for submitting log records
///
/// This is a lightweight handle that can be cloned and passed to any thread.
/// The ring and the level table are shared via Arc.
#[derive(Clone)]
pub struct Logger {
    ring: Arc<MpscRing>,
    levels: Arc<LogLevels>,
}

impl Logger {
    pub fn new(ring: Arc<MpscRing>, levels: Arc<LogLevels>) -> Self {
        Self { ring, levels }
    }

    /// Logger over a fresh ring of the given capacity, with Info as threshold
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(
            Arc::new(MpscRing::new(capacity)),
            Arc::new(LogLevels::default()),
        )
    }

    /// Submit a record, reporting back-pressure explicitly
    ///
    /// Records below the configured threshold are discarded and count as
    /// success. A full ring hands the record back inside `RingFull`.
    #[inline]
    pub fn submit(&self, record: LogRecord) -> Result<(), RingFull> {
        if !self.levels.enabled(record.severity, record.facility) {
            return Ok(());
        }
        self.ring.push(record)
    }

    /// Submit a record, dropping it if the ring is full
    ///
    /// Returns whether the record was enqueued or filtered.
    #[inline]
    pub fn emit(&self, record: LogRecord) -> bool {
        self.submit(record).is_ok()
    }

    #[inline]
    pub fn enabled(&self, severity: Severity, facility: Facility) -> bool {
        self.levels.enabled(severity, facility)
    }

    /// Build and emit a record from its parts
    pub fn log(
        &self,
        severity: Severity,
        facility: Facility,
        template: &'static str,
        args: &[LogArg],
    ) -> bool {
        self.emit(LogRecord::new(severity, facility, template).with_args(args.iter().cloned()))
    }

    #[inline]
    pub fn fatal(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Fatal, facility, message, &[]);
    }

    #[inline]
    pub fn error(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Error, facility, message, &[]);
    }

    #[inline]
    pub fn warn(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Warn, facility, message, &[]);
    }

    #[inline]
    pub fn info(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Info, facility, message, &[]);
    }

    #[inline]
    pub fn debug(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Debug, facility, message, &[]);
    }

    #[inline]
    pub fn trace(&self, facility: Facility, message: &'static str) {
        self.log(Severity::Trace, facility, message, &[]);
    }

    pub fn ring_capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn ring_size(&self) -> usize {
        self.ring.len()
    }

    /// Records rejected because the ring was full
    pub fn dropped(&self) -> u64 {
        self.ring.dropped()
    }

    pub fn levels(&self) -> &LogLevels {
        &self.levels
    }

    pub(crate) fn ring(&self) -> &Arc<MpscRing> {
        &self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_count(logger: &Logger) -> usize {
        std::iter::from_fn(|| logger.ring().pop()).count()
    }

    #[test]
    fn test_severity_helpers() {
        let logger = Logger::with_capacity(16);
        logger.levels().set_global(Severity::Trace);

        logger.fatal(Facility::Test, "Fatal");
        logger.error(Facility::Test, "Error");
        logger.warn(Facility::Test, "Warn");
        logger.info(Facility::Test, "Info");
        logger.debug(Facility::Test, "Debug");
        logger.trace(Facility::Test, "Trace");

        assert_eq!(logger.ring_size(), 6);
        let first = logger.ring().pop().unwrap();
        assert_eq!(first.severity, Severity::Fatal);
        assert_eq!(first.message(), "Fatal");
    }

    #[test]
    fn test_global_log_level_filtering() {
        let logger = Logger::with_capacity(16);
        logger.levels().set_global(Severity::Warn);

        logger.fatal(Facility::Test, "Fatal");
        logger.error(Facility::Test, "Error");
        logger.warn(Facility::Test, "Warn");
        logger.info(Facility::Test, "Info");
        logger.debug(Facility::Test, "Debug");
        logger.trace(Facility::Test, "Trace");

        assert_eq!(drain_count(&logger), 3, "Expected Fatal, Error and Warn only");
    }

    #[test]
    fn test_facility_level_overrides_global() {
        let logger = Logger::with_capacity(16);
        logger.levels().set_global(Severity::Error);
        logger.levels().set_facility(Facility::Script, Severity::Debug);

        logger.debug(Facility::Script, "Debug from Script");
        logger.info(Facility::Console, "Info from Console");
        logger.error(Facility::Console, "Error from Console");

        let facilities: Vec<Facility> = std::iter::from_fn(|| logger.ring().pop())
            .map(|r| r.facility)
            .collect();
        assert_eq!(facilities, vec![Facility::Script, Facility::Console]);
    }

    #[test]
    fn test_set_and_get_levels() {
        let levels = LogLevels::default();
        assert_eq!(levels.global(), Severity::Info);

        levels.set_global(Severity::Warn);
        levels.set_facility(Facility::Monitor, Severity::Trace);
        assert_eq!(levels.facility(Facility::Monitor), Severity::Trace);
        assert_eq!(levels.facility(Facility::Console), Severity::Warn);

        levels.clear_facility(Facility::Monitor);
        assert_eq!(levels.facility(Facility::Monitor), Severity::Warn);
    }

    #[test]
    fn test_filtered_record_does_not_touch_ring() {
        let logger = Logger::with_capacity(1);
        logger.info(Facility::Test, "fills the ring");
        assert!(logger
            .submit(LogRecord::new(Severity::Trace, Facility::Test, "filtered"))
            .is_ok());
        assert_eq!(logger.dropped(), 0);
    }

    #[test]
    fn test_submit_reports_full_ring() {
        let logger = Logger::with_capacity(2);
        assert!(logger.emit(LogRecord::new(Severity::Info, Facility::Test, "1")));
        assert!(logger.emit(LogRecord::new(Severity::Info, Facility::Test, "2")));

        let err = logger
            .submit(LogRecord::new(Severity::Info, Facility::Test, "3"))
            .unwrap_err();
        assert_eq!(err.into_record().template, "3");
        assert_eq!(logger.ring_size(), 2);
        assert_eq!(logger.ring_capacity(), 2);
        assert_eq!(logger.dropped(), 1);
    }

    #[test]
    fn test_logger_clone_shares_ring() {
        let logger1 = Logger::with_capacity(8);
        let logger2 = logger1.clone();

        logger1.info(Facility::Test, "From logger1");
        logger2.info(Facility::Test, "From logger2");

        assert_eq!(logger1.ring_size(), 2);
        logger2.levels().set_global(Severity::Error);
        assert_eq!(logger1.levels().global(), Severity::Error);
    }
}
