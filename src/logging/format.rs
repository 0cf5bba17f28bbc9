// SPDX-License-Identifier: Apache-2.0 OR MIT
// Rendering of log records into bounded output lines

use super::record::{clock_anchor, LogRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The maximum size (in bytes) of one rendered log record
pub const LOG_MAX_RECORD: usize = 512;

/// Output format of rendered records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `[SEVERITY] [Facility] file:line: message`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// A `fmt::Write` target that silently stops accepting input at a byte limit
///
/// Truncation always lands on a UTF-8 character boundary.
pub struct BoundedBuf {
    buf: String,
    limit: usize,
    truncated: bool,
}

impl BoundedBuf {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: String::with_capacity(limit),
            limit,
            truncated: false,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Write for BoundedBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        let room = self.limit - self.buf.len();
        if s.len() <= room {
            self.buf.push_str(s);
            return Ok(());
        }
        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf.push_str(&s[..cut]);
        self.truncated = true;
        Ok(())
    }
}

/// Render a record in the given format, capped at `LOG_MAX_RECORD` bytes
///
/// Rendering is a pure function of the record: the same record always
/// produces byte-identical output.
pub fn render(record: &LogRecord, format: LogFormat) -> String {
    match format {
        LogFormat::Text => render_text(record),
        LogFormat::Json => render_json(record),
    }
}

fn render_text(record: &LogRecord) -> String {
    use fmt::Write as _;

    let mut out = BoundedBuf::new(LOG_MAX_RECORD);
    let _ = write!(
        out,
        "[{}] [{}] {}:{}: ",
        record.severity, record.facility, record.file, record.line
    );
    let _ = record.write_message(&mut out);
    out.into_string()
}

fn render_json(record: &LogRecord) -> String {
    let timestamp = wall_clock_for(record.timestamp_ns);
    let object = |file: &str, message: &str| {
        serde_json::json!({
            "timestamp": timestamp,
            "level": record.severity.as_str(),
            "facility": record.facility.as_str(),
            "file": file,
            "line": record.line,
            "thread": record.thread_id,
            "sequence": record.sequence,
            "message": message,
        })
        .to_string()
    };

    let mut full = BoundedBuf::new(LOG_MAX_RECORD);
    let _ = record.write_message(&mut full);
    let full = full.into_string();

    // Shrink the message, then the front of the file path, until the
    // serialized object fits. Escaping only ever grows a field, so
    // dropping `excess` raw bytes removes at least `excess` output bytes.
    let mut message = full.as_str();
    let mut file = record.file;
    loop {
        let line = object(file, message);
        if line.len() <= LOG_MAX_RECORD {
            return line;
        }
        let excess = line.len() - LOG_MAX_RECORD;
        if !message.is_empty() {
            message = floor_prefix(message, message.len().saturating_sub(excess));
        } else if !file.is_empty() {
            file = ceil_suffix(file, excess);
        } else {
            return line;
        }
    }
}

/// Longest prefix of `s` of at most `len` bytes
fn floor_prefix(s: &str, len: usize) -> &str {
    let mut cut = len.min(s.len());
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

/// `s` without at least its first `skip` bytes
fn ceil_suffix(s: &str, skip: usize) -> &str {
    let mut cut = skip.min(s.len());
    while !s.is_char_boundary(cut) {
        cut += 1;
    }
    &s[cut..]
}

/// Map a monotonic capture time onto the wall clock
///
/// Capture times count from the same anchor, so a record carries the wall
/// time it was produced at, however late it is rendered.
fn wall_clock_for(timestamp_ns: u64) -> String {
    let anchor = clock_anchor();
    let at = anchor.wall + chrono::Duration::nanoseconds(timestamp_ns as i64);
    at.to_rfc3339()
}
