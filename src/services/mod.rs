// SPDX-License-Identifier: Apache-2.0 OR MIT
// Built-in services
//
// Each module defines its service type and its ordinal table as constants.

pub mod console;
pub mod log;
pub mod monitor;
pub mod script;

pub use console::ConsoleService;
pub use log::LogService;
pub use monitor::MonitorService;
pub use script::{DriveState, Operation, ScriptService};
