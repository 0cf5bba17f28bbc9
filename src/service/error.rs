// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::Code;
use std::fmt;
use thiserror::Error;

/// Lifecycle hook identity, used in advisory warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Load,
    Unload,
    Start,
    Stop,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Load => "load",
            Hook::Unload => "unload",
            Hook::Start => "start",
            Hook::Stop => "stop",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors of the service lifecycle and dispatch framework
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service {0} is already loaded")]
    AlreadyLoaded(&'static str),

    #[error("service {0} is not loaded")]
    NotLoaded(&'static str),

    #[error("service {0} is already started")]
    AlreadyStarted(&'static str),

    #[error("service {0} is not started")]
    NotStarted(&'static str),

    #[error("state allocation failed for {service}: all {capacity} slots in use")]
    AllocationFailure {
        service: &'static str,
        capacity: usize,
    },

    #[error("service {service} has no handler for ordinal {ordinal}")]
    DispatchUnsupported {
        service: &'static str,
        ordinal: u32,
    },

    /// A hook reported nonzero; only produced when a caller asks for strict
    /// transitions, the framework itself treats it as advisory
    #[error("{service} reported code {code} during {hook}")]
    CallbackWarning {
        service: &'static str,
        hook: Hook,
        code: Code,
    },

    #[error("service {0} is already registered")]
    DuplicateService(&'static str),

    #[error("no service named {0}")]
    UnknownService(String),
}

impl ServiceError {
    /// Stable nonzero integer code for this error
    ///
    /// Every variant has its own code; the code a hook reported stays in
    /// `CallbackWarning::code`.
    pub fn code(&self) -> Code {
        match self {
            ServiceError::AlreadyLoaded(_) => 1,
            ServiceError::NotLoaded(_) => 2,
            ServiceError::AlreadyStarted(_) => 3,
            ServiceError::NotStarted(_) => 4,
            ServiceError::AllocationFailure { .. } => 5,
            ServiceError::DispatchUnsupported { .. } => 6,
            ServiceError::CallbackWarning { .. } => 7,
            ServiceError::DuplicateService(_) => 8,
            ServiceError::UnknownService(_) => 9,
        }
    }
}

/// Collapse a framework result into an integer status (0 on success)
pub fn status_code<T>(result: &Result<T, ServiceError>) -> Code {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}
