// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log record: severity, template, tagged arguments and call-site provenance

use super::{Facility, Severity};
use std::fmt::{self, Write as _};

/// Maximum number of arguments carried by a single record
pub const MAX_LOG_ARGS: usize = 8;

/// Maximum bytes stored for one string argument (longer strings are truncated)
pub const MAX_STR_ARG: usize = 96;

/// Inline storage for a string argument, so a record never borrows caller memory
pub type ArgStr = heapless::String<MAX_STR_ARG>;

/// Type tag of a log argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgTag {
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Isize,
    Usize,
    F32,
    F64,
    Str,
    Ptr,
}

/// A tagged log argument; the variant is the tag and the payload the value
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),
    Str(ArgStr),
    /// An opaque address, rendered in hex
    Ptr(usize),
}

impl LogArg {
    pub fn tag(&self) -> ArgTag {
        match self {
            LogArg::Char(_) => ArgTag::Char,
            LogArg::I8(_) => ArgTag::I8,
            LogArg::U8(_) => ArgTag::U8,
            LogArg::I16(_) => ArgTag::I16,
            LogArg::U16(_) => ArgTag::U16,
            LogArg::I32(_) => ArgTag::I32,
            LogArg::U32(_) => ArgTag::U32,
            LogArg::I64(_) => ArgTag::I64,
            LogArg::U64(_) => ArgTag::U64,
            LogArg::Isize(_) => ArgTag::Isize,
            LogArg::Usize(_) => ArgTag::Usize,
            LogArg::F32(_) => ArgTag::F32,
            LogArg::F64(_) => ArgTag::F64,
            LogArg::Str(_) => ArgTag::Str,
            LogArg::Ptr(_) => ArgTag::Ptr,
        }
    }

    /// Build a string argument, truncating on a character boundary
    pub fn str(value: &str) -> Self {
        let mut s = ArgStr::new();
        for c in value.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        LogArg::Str(s)
    }

    /// Build an address argument from any pointer
    pub fn ptr<T: ?Sized>(ptr: *const T) -> Self {
        LogArg::Ptr(ptr.cast::<()>() as usize)
    }
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Char(v) => write!(f, "{}", v),
            LogArg::I8(v) => write!(f, "{}", v),
            LogArg::U8(v) => write!(f, "{}", v),
            LogArg::I16(v) => write!(f, "{}", v),
            LogArg::U16(v) => write!(f, "{}", v),
            LogArg::I32(v) => write!(f, "{}", v),
            LogArg::U32(v) => write!(f, "{}", v),
            LogArg::I64(v) => write!(f, "{}", v),
            LogArg::U64(v) => write!(f, "{}", v),
            LogArg::Isize(v) => write!(f, "{}", v),
            LogArg::Usize(v) => write!(f, "{}", v),
            LogArg::F32(v) => write!(f, "{}", v),
            LogArg::F64(v) => write!(f, "{}", v),
            LogArg::Str(v) => f.write_str(v),
            LogArg::Ptr(v) => write!(f, "{:#x}", v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::$variant(value)
                }
            }
        )+
    };
}

impl_from_primitive! {
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    isize => Isize,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::str(if value { "true" } else { "false" })
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::str(value)
    }
}

impl From<&String> for LogArg {
    fn from(value: &String) -> Self {
        LogArg::str(value)
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::str(&value)
    }
}

impl<T: ?Sized> From<*const T> for LogArg {
    fn from(value: *const T) -> Self {
        LogArg::ptr(value)
    }
}

/// A log record as produced at the call site
///
/// Records are built synchronously by the producer, moved by value into a
/// ring slot and rendered later by the consumer. No formatting happens on the
/// producer side.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub facility: Facility,
    pub template: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub timestamp_ns: u64,
    pub thread_id: u32,
    /// Assigned by the ring at reservation time
    pub sequence: u64,
    args: heapless::Vec<LogArg, MAX_LOG_ARGS>,
}

impl LogRecord {
    pub fn new(severity: Severity, facility: Facility, template: &'static str) -> Self {
        Self {
            severity,
            facility,
            template,
            file: "",
            line: 0,
            timestamp_ns: monotonic_nanos(),
            thread_id: current_thread_id(),
            sequence: 0,
            args: heapless::Vec::new(),
        }
    }

    /// Set the source location
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = file;
        self.line = line;
        self
    }

    /// Append one argument (ignored once MAX_LOG_ARGS are present)
    pub fn arg(mut self, arg: impl Into<LogArg>) -> Self {
        self.push_arg(arg.into());
        self
    }

    /// Append arguments in order
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = LogArg>,
    {
        for arg in args {
            self.push_arg(arg);
        }
        self
    }

    fn push_arg(&mut self, arg: LogArg) {
        let _ = self.args.push(arg);
    }

    pub fn args(&self) -> &[LogArg] {
        &self.args
    }

    /// Substitute arguments into the template
    ///
    /// `{}` takes the next argument, `{{` and `}}` are literal braces, and a
    /// placeholder with no argument left is written out unchanged.
    pub fn write_message<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut args = self.args.iter();
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('{', Some('{')) => {
                    chars.next();
                    out.write_char('{')?;
                }
                ('}', Some('}')) => {
                    chars.next();
                    out.write_char('}')?;
                }
                ('{', Some('}')) => {
                    chars.next();
                    match args.next() {
                        Some(arg) => write!(out, "{}", arg)?,
                        None => out.write_str("{}")?,
                    }
                }
                _ => out.write_char(c)?,
            }
        }
        Ok(())
    }

    /// Render only the message part
    pub fn message(&self) -> String {
        let mut message = String::with_capacity(self.template.len());
        let _ = self.write_message(&mut message);
        message
    }
}

/// Process clock anchor: a monotonic instant and the wall time read with it
pub(crate) struct ClockAnchor {
    pub(crate) instant: std::time::Instant,
    pub(crate) wall: chrono::DateTime<chrono::Utc>,
}

pub(crate) fn clock_anchor() -> &'static ClockAnchor {
    static ANCHOR: std::sync::OnceLock<ClockAnchor> = std::sync::OnceLock::new();
    ANCHOR.get_or_init(|| ClockAnchor {
        instant: std::time::Instant::now(),
        wall: chrono::Utc::now(),
    })
}

/// Get monotonic nanoseconds since the clock anchor
fn monotonic_nanos() -> u64 {
    clock_anchor().instant.elapsed().as_nanos() as u64
}

/// Get current thread ID (truncated to u32)
fn current_thread_id() -> u32 {
    #[cfg(target_os = "linux")]
    {
        unsafe { libc::gettid() as u32 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::sync::atomic::{AtomicU32, Ordering};
        static NEXT: AtomicU32 = AtomicU32::new(1);
        thread_local! {
            static ID: u32 = NEXT.fetch_add(1, Ordering::Relaxed);
        }
        ID.with(|id| *id)
    }
}
