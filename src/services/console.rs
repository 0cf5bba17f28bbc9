// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Console service: owns the console UI thread
//!
//! The thread runs between `on_start` and `on_stop`. There is no dispatcher.

use crate::logging::Facility;
use crate::service::{Code, Service, ServiceContext, ServiceDescriptor, WorkerThread, OK};
use crate::{log_debug, log_error, log_info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct ConsoleService {
    worker: Option<WorkerThread>,
    frames: Arc<AtomicU64>,
}

impl ConsoleService {
    pub const NAME: &'static str = "console";
    pub const DESCRIPTION: &'static str =
        "The console service runs the console user interface (CUI).";

    pub fn new() -> Self {
        Self {
            worker: None,
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter of console loop iterations, shared with the thread
    pub fn frames(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    pub fn descriptor(self) -> ServiceDescriptor {
        ServiceDescriptor::new(Self::NAME, Self::DESCRIPTION, self)
    }
}

impl Default for ConsoleService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for ConsoleService {
    fn on_load(&mut self, ctx: &ServiceContext) -> Code {
        log_debug!(ctx.logger(), Facility::Console, "Console surface initialized");
        OK
    }

    fn on_unload(&mut self, ctx: &ServiceContext) -> Code {
        log_debug!(ctx.logger(), Facility::Console, "Console surface torn down");
        OK
    }

    fn on_start(&mut self, ctx: &ServiceContext) -> Code {
        let logger = ctx.logger().clone();
        let frames = Arc::clone(&self.frames);
        let tick = Duration::from_millis(ctx.config().console.tick_ms);

        let spawned = WorkerThread::spawn("console", move |kill| {
            log_info!(logger, Facility::Console, "The console thread has started");
            while !kill.is_set() {
                frames.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(tick);
            }
            log_debug!(logger, Facility::Console, "The console thread is exiting");
        });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                OK
            }
            Err(e) => {
                log_error!(
                    ctx.logger(),
                    Facility::Console,
                    "Failed to spawn the console thread: {}",
                    e.to_string()
                );
                1
            }
        }
    }

    fn on_stop(&mut self, ctx: &ServiceContext) -> Code {
        let Some(worker) = self.worker.take() else {
            return OK;
        };
        if worker.stop().is_err() {
            log_error!(ctx.logger(), Facility::Console, "Failed to join the console thread");
            return 1;
        }
        OK
    }
}
