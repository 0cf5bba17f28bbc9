// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Script service: runs one client operation on the script thread and
//! exposes WASD drive control
//!
//! | Ordinal                   | In                  | Out                 |
//! |---------------------------|---------------------|---------------------|
//! | `OP_EXEC`                 | `Int` (operation)   | -                   |
//! | `WASD_SET_FWD` ... `_RIGHT` | -                 | `Int` (drive bits)  |
//!
//! `friends-list` and `friends-remove` finish on their own; `interact`
//! keeps driving until the service stops.

use crate::logging::Facility;
use crate::service::{
    CallArg, Code, Dispatch, Ordinal, Service, ServiceContext, ServiceDescriptor, WorkerThread, OK,
};
use crate::{log_debug, log_error, log_info, log_warn};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const OP_EXEC: Ordinal = 0;
pub const WASD_SET_FWD: Ordinal = 1;
pub const WASD_CLR_FWD: Ordinal = 2;
pub const WASD_SET_REV: Ordinal = 3;
pub const WASD_CLR_REV: Ordinal = 4;
pub const WASD_SET_LEFT: Ordinal = 5;
pub const WASD_CLR_LEFT: Ordinal = 6;
pub const WASD_SET_RIGHT: Ordinal = 7;
pub const WASD_CLR_RIGHT: Ordinal = 8;

/// Client operation run by `OP_EXEC`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Operation {
    FriendsList = 0,
    FriendsRemove = 1,
    Interact = 2,
}

impl Operation {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Operation::FriendsList),
            1 => Some(Operation::FriendsRemove),
            2 => Some(Operation::Interact),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FriendsList => "friends-list",
            Operation::FriendsRemove => "friends-remove",
            Operation::Interact => "interact",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Operation> for CallArg {
    fn from(op: Operation) -> Self {
        CallArg::Int(op as i64)
    }
}

/// Engaged WASD directions as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveState(u8);

impl DriveState {
    pub const FORWARD: u8 = 1 << 0;
    pub const REVERSE: u8 = 1 << 1;
    pub const LEFT: u8 = 1 << 2;
    pub const RIGHT: u8 = 1 << 3;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::FORWARD | Self::REVERSE | Self::LEFT | Self::RIGHT))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// Tread directions (left, right), each in -1..=1
    ///
    /// Opposite keys cancel. A turn key alone spins in place.
    pub fn treads(self) -> (i8, i8) {
        let throttle = self.has(Self::FORWARD) as i8 - self.has(Self::REVERSE) as i8;
        let steer = self.has(Self::RIGHT) as i8 - self.has(Self::LEFT) as i8;
        (
            (throttle + steer).clamp(-1, 1),
            (throttle - steer).clamp(-1, 1),
        )
    }
}

pub struct ScriptService {
    worker: Option<WorkerThread>,
    drive: Arc<AtomicU8>,
}

impl ScriptService {
    pub const NAME: &'static str = "script";
    pub const DESCRIPTION: &'static str =
        "The script service hosts the client operations and the robot drive controls.";

    pub fn new() -> Self {
        Self {
            worker: None,
            drive: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Shared view of the drive bitmask
    pub fn drive(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.drive)
    }

    pub fn descriptor(self) -> ServiceDescriptor {
        ServiceDescriptor::new(Self::NAME, Self::DESCRIPTION, self)
    }

    fn exec(&mut self, ctx: &ServiceContext, op: Operation) -> Code {
        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            log_error!(ctx.logger(), Facility::Script, "A script operation is already running");
            return 1;
        }
        // Reap a finished previous operation
        if let Some(previous) = self.worker.take() {
            let _ = previous.stop();
        }

        let logger = ctx.logger().clone();
        let drive = Arc::clone(&self.drive);
        let tick = Duration::from_millis(ctx.config().script.tick_ms);

        let spawned = WorkerThread::spawn("script", move |kill| {
            log_info!(logger, Facility::Script, "The script thread has started ({})", op.as_str());
            match op {
                Operation::FriendsList | Operation::FriendsRemove => {
                    log_info!(logger, Facility::Script, "Operation {} complete", op.as_str());
                }
                Operation::Interact => {
                    let mut treads = DriveState::default().treads();
                    while !kill.is_set() {
                        let current = DriveState::from_bits(drive.load(Ordering::Acquire)).treads();
                        if current != treads {
                            treads = current;
                            log_debug!(logger, Facility::Script, "Treads {} {}", treads.0, treads.1);
                        }
                        std::thread::sleep(tick);
                    }
                    log_info!(logger, Facility::Script, "Interactive mode stopped");
                }
            }
        });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                OK
            }
            Err(e) => {
                log_error!(
                    ctx.logger(),
                    Facility::Script,
                    "Failed to spawn the script thread: {}",
                    e.to_string()
                );
                1
            }
        }
    }

    fn wasd(&self, bit: u8, engage: bool) -> u8 {
        if engage {
            self.drive.fetch_or(bit, Ordering::AcqRel) | bit
        } else {
            self.drive.fetch_and(!bit, Ordering::AcqRel) & !bit
        }
    }
}

impl Default for ScriptService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for ScriptService {
    fn on_load(&mut self, ctx: &ServiceContext) -> Code {
        log_debug!(ctx.logger(), Facility::Script, "Script host initialized");
        OK
    }

    fn on_unload(&mut self, ctx: &ServiceContext) -> Code {
        self.drive.store(0, Ordering::Release);
        log_debug!(ctx.logger(), Facility::Script, "Script host finalized");
        OK
    }

    fn on_start(&mut self, ctx: &ServiceContext) -> Code {
        log_info!(ctx.logger(), Facility::Script, "The script service has started");
        OK
    }

    fn on_stop(&mut self, ctx: &ServiceContext) -> Code {
        if let Some(worker) = self.worker.take() {
            // Failing to join only leaks the thread; not an error
            if worker.stop().is_err() {
                log_warn!(ctx.logger(), Facility::Script, "Failed to join the script thread");
            }
        }
        OK
    }

    fn dispatcher(&mut self) -> Option<&mut dyn Dispatch> {
        Some(self)
    }
}

impl Dispatch for ScriptService {
    fn on_call(
        &mut self,
        ctx: &ServiceContext,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Option<Code> {
        let (bit, engage) = match ordinal {
            OP_EXEC => {
                let code = match arg_in.as_int().and_then(Operation::from_i64) {
                    Some(op) => self.exec(ctx, op),
                    None => {
                        log_error!(ctx.logger(), Facility::Script, "Unknown script operation");
                        1
                    }
                };
                return Some(code);
            }
            WASD_SET_FWD => (DriveState::FORWARD, true),
            WASD_CLR_FWD => (DriveState::FORWARD, false),
            WASD_SET_REV => (DriveState::REVERSE, true),
            WASD_CLR_REV => (DriveState::REVERSE, false),
            WASD_SET_LEFT => (DriveState::LEFT, true),
            WASD_CLR_LEFT => (DriveState::LEFT, false),
            WASD_SET_RIGHT => (DriveState::RIGHT, true),
            WASD_CLR_RIGHT => (DriveState::RIGHT, false),
            _ => return None,
        };

        let bits = self.wasd(bit, engage);
        *arg_out = CallArg::Int(bits as i64);
        Some(OK)
    }
}
