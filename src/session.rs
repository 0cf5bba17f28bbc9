// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Application session
//!
//! Registers the built-in services, brings them up, runs the selected script
//! operation, drives the monitor window until it closes, and tears every
//! service down in reverse order.

use crate::logging::Facility;
use crate::service::{
    BulkResult, CallArg, Code, KillSwitch, LifecycleController, ServiceContext, ServiceError,
    ServiceRegistry, StatePool, OK,
};
use crate::services::{monitor, script, ConsoleService, LogService, MonitorService, Operation, ScriptService};
use crate::{log_info, log_warn};

/// What happened during a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Monitor frames presented
    pub frames: u64,
    /// Lifecycle errors, dispatch errors and nonzero call codes
    pub failures: usize,
    /// Hooks that reported a nonzero code
    pub warnings: usize,
    /// The session was asked to stop before the window closed
    pub interrupted: bool,
}

impl SessionReport {
    fn absorb(&mut self, results: &BulkResult) {
        for (_, result) in results {
            match result {
                Ok(transition) if !transition.is_clean() => self.warnings += 1,
                Ok(_) => {}
                Err(_) => self.failures += 1,
            }
        }
    }

    fn absorb_call(&mut self, result: Result<Code, ServiceError>) -> bool {
        match result {
            Ok(OK) => true,
            _ => {
                self.failures += 1;
                false
            }
        }
    }
}

pub struct Session {
    registry: ServiceRegistry,
    shutdown: KillSwitch,
}

impl Session {
    /// Register the built-in services
    pub fn new(ctx: ServiceContext) -> Result<Self, ServiceError> {
        let pool = StatePool::new(ctx.config().max_loaded);
        let mut registry = ServiceRegistry::new(LifecycleController::new(ctx, pool));
        registry.register(LogService::new().descriptor())?;
        registry.register(ConsoleService::new().descriptor())?;
        registry.register(ScriptService::new().descriptor())?;
        registry.register(MonitorService::new().descriptor())?;

        Ok(Self {
            registry,
            shutdown: KillSwitch::new(),
        })
    }

    /// Switch that ends the monitor loop early
    pub fn shutdown_handle(&self) -> KillSwitch {
        self.shutdown.clone()
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Run the whole session; every service is unloaded on return
    pub fn run(&mut self, operation: Operation) -> SessionReport {
        let logger = self.registry.controller().context().logger().clone();
        let mut report = SessionReport::default();

        log_info!(logger, Facility::Main, "Cozmonaut is starting up...");

        report.absorb(&self.registry.load_all());
        report.absorb(&self.registry.start_all());

        let mut out = CallArg::Empty;
        let exec = self.registry.call(
            ScriptService::NAME,
            script::OP_EXEC,
            &operation.into(),
            &mut out,
        );
        report.absorb_call(exec);

        let opened = self.registry.call(
            MonitorService::NAME,
            monitor::WIN_OPEN,
            &CallArg::Empty,
            &mut out,
        );
        if report.absorb_call(opened) {
            self.drive_monitor(&mut report);
            let closed = self.registry.call(
                MonitorService::NAME,
                monitor::WIN_CLOSE,
                &CallArg::Empty,
                &mut out,
            );
            report.absorb_call(closed);
        }

        report.absorb(&self.registry.stop_all());
        report.absorb(&self.registry.unload_all());

        if report.failures > 0 {
            log_warn!(
                logger,
                Facility::Main,
                "Session finished with {} failed operations",
                report.failures
            );
        }
        log_info!(logger, Facility::Main, "Cozmonaut is shutting down");
        report
    }

    fn drive_monitor(&mut self, report: &mut SessionReport) {
        let mut out = CallArg::Empty;
        loop {
            if self.shutdown.is_set() {
                report.interrupted = true;
                break;
            }

            let query = self.registry.call(
                MonitorService::NAME,
                monitor::WIN_QUERY,
                &CallArg::Empty,
                &mut out,
            );
            if !report.absorb_call(query) || out.as_bool() != Some(true) {
                break;
            }

            let update = self.registry.call(
                MonitorService::NAME,
                monitor::WIN_UPDATE,
                &CallArg::Empty,
                &mut out,
            );
            if !report.absorb_call(update) {
                break;
            }
            report.frames += 1;
        }
    }
}
