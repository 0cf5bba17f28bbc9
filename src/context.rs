// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process context
//!
//! The startup routine fills a [`ProcessContextBuilder`] (the only mutable
//! view) and freezes it exactly once; everything else receives the resulting
//! read-only [`ProcessContext`] through an `Arc`.

use std::ffi::OsString;
use std::sync::Arc;

/// Read-only view of the process arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessContext {
    argv: Vec<String>,
}

impl ProcessContext {
    /// A context with no arguments
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Name the process was invoked as
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Mutable view of the process context, owned by the startup routine
#[derive(Debug, Default)]
pub struct ProcessContextBuilder {
    argv: Vec<String>,
}

impl ProcessContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the arguments of the running process
    ///
    /// Arguments that are not valid Unicode are converted lossily.
    pub fn from_env() -> Self {
        Self::new().args(std::env::args_os())
    }

    /// Replace the argument vector
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.argv = args
            .into_iter()
            .map(|arg| arg.into().to_string_lossy().into_owned())
            .collect();
        self
    }

    /// Append one argument
    pub fn push_arg(&mut self, arg: impl Into<String>) {
        self.argv.push(arg.into());
    }

    /// Publish the context; the builder is consumed so this happens once
    pub fn freeze(self) -> Arc<ProcessContext> {
        Arc::new(ProcessContext { argv: self.argv })
    }
}
