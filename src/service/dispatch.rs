// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Call payloads for ordinal dispatch
//!
//! Every call carries one read-only input and one output slot. Both are
//! `CallArg` values, so a handler matches on the variant it expects instead
//! of casting an untyped pointer.

use crate::logging::LogRecord;

/// Tagged payload of a dispatched call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CallArg {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Size(usize),
    Text(String),
    Record(Box<LogRecord>),
}

impl CallArg {
    pub fn is_empty(&self) -> bool {
        matches!(self, CallArg::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CallArg::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CallArg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<usize> {
        match self {
            CallArg::Size(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CallArg::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&LogRecord> {
        match self {
            CallArg::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Replace the payload, returning the previous one
    pub fn replace(&mut self, value: CallArg) -> CallArg {
        std::mem::replace(self, value)
    }
}

impl From<bool> for CallArg {
    fn from(value: bool) -> Self {
        CallArg::Bool(value)
    }
}

impl From<i64> for CallArg {
    fn from(value: i64) -> Self {
        CallArg::Int(value)
    }
}

impl From<usize> for CallArg {
    fn from(value: usize) -> Self {
        CallArg::Size(value)
    }
}

impl From<String> for CallArg {
    fn from(value: String) -> Self {
        CallArg::Text(value)
    }
}

impl From<&str> for CallArg {
    fn from(value: &str) -> Self {
        CallArg::Text(value.to_string())
    }
}

impl From<LogRecord> for CallArg {
    fn from(value: LogRecord) -> Self {
        CallArg::Record(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Facility, Severity};

    #[test]
    fn test_accessors_match_variant_only() {
        assert_eq!(CallArg::from(true).as_bool(), Some(true));
        assert_eq!(CallArg::from(7usize).as_size(), Some(7));
        assert_eq!(CallArg::from(7usize).as_int(), None);
        assert_eq!(CallArg::from("hi").as_text(), Some("hi"));
        assert!(CallArg::default().is_empty());
    }

    #[test]
    fn test_record_payload() {
        let record = LogRecord::new(Severity::Info, Facility::Test, "x");
        let arg = CallArg::from(record.clone());
        assert_eq!(arg.as_record(), Some(&record));
    }

    #[test]
    fn test_replace() {
        let mut out = CallArg::Empty;
        let prev = out.replace(CallArg::Bool(false));
        assert!(prev.is_empty());
        assert_eq!(out.as_bool(), Some(false));
    }
}
