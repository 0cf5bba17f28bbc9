// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Service runtime and lock-free log pipeline for the Cozmonaut control
//! application.
//!
//! - [`logging`]: tagged log records, the MPSC ring, the background consumer
//! - [`service`]: the lifecycle controller, ordinal dispatch, the registry
//! - [`services`]: the built-in log, console, script and monitor services
//! - [`session`]: the startup-to-shutdown sequence driven by the binary

pub mod config;
pub mod context;
pub mod logging;
pub mod service;
pub mod services;
pub mod session;

pub use config::{Config, ConfigError};
pub use context::{ProcessContext, ProcessContextBuilder};
pub use session::{Session, SessionReport};
