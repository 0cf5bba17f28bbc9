// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lifecycle controller
//!
//! Drives a [`ServiceDescriptor`] through load, start, stop and unload. A
//! nonzero hook result is logged and reported in the returned
//! [`Transition`], but never rolls the transition back. The controller does
//! not lock: every operation takes the descriptor by `&mut`, so the caller
//! serializes transitions of one service.

use super::{
    CallArg, Code, Hook, Ordinal, ServiceContext, ServiceDescriptor, ServiceError, ServiceState,
    StatePool, OK,
};
use crate::logging::Facility;
use crate::{log_error, log_info, log_trace, log_warn};

/// A hook that reported a nonzero code during a completed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackWarning {
    pub hook: Hook,
    pub code: Code,
}

/// Outcome of a lifecycle transition that took effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    service: &'static str,
    warning: Option<CallbackWarning>,
}

impl Transition {
    fn completed(service: &'static str, hook: Hook, code: Code) -> Self {
        Self {
            service,
            warning: (code != OK).then_some(CallbackWarning { hook, code }),
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn warning(&self) -> Option<CallbackWarning> {
        self.warning
    }

    /// True when the hook reported success
    pub fn is_clean(&self) -> bool {
        self.warning.is_none()
    }

    /// Turn an advisory hook code into an error
    ///
    /// The transition has still happened; this is for orchestrators that
    /// want to abort startup on any hook failure.
    pub fn strict(self) -> Result<(), ServiceError> {
        match self.warning {
            None => Ok(()),
            Some(CallbackWarning { hook, code }) => Err(ServiceError::CallbackWarning {
                service: self.service,
                hook,
                code,
            }),
        }
    }
}

/// Applies lifecycle transitions and routes calls
pub struct LifecycleController {
    ctx: ServiceContext,
    pool: StatePool,
}

impl LifecycleController {
    pub fn new(ctx: ServiceContext, pool: StatePool) -> Self {
        Self { ctx, pool }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn pool(&self) -> &StatePool {
        &self.pool
    }

    /// Allocate state and run `on_load`
    pub fn load(&self, svc: &mut ServiceDescriptor) -> Result<Transition, ServiceError> {
        let logger = self.ctx.logger();
        log_trace!(logger, Facility::Service, "Loading {}", svc.name);

        if svc.state.is_some() {
            log_error!(logger, Facility::Service, "Already loaded {}", svc.name);
            return Err(ServiceError::AlreadyLoaded(svc.name));
        }

        let Some(lease) = self.pool.lease() else {
            log_error!(
                logger,
                Facility::Service,
                "State allocation failed for {} ({} slots in use)",
                svc.name,
                self.pool.in_use()
            );
            return Err(ServiceError::AllocationFailure {
                service: svc.name,
                capacity: self.pool.capacity(),
            });
        };
        svc.state = Some(ServiceState::new(lease));

        let code = self.run_hook(svc, Hook::Load);

        log_info!(logger, Facility::Service, "Loaded {}", svc.name);
        log_info!(logger, Facility::Service, "{}", svc.description);
        Ok(Transition::completed(svc.name, Hook::Load, code))
    }

    /// Run `on_unload` and free state, whatever the hook reports
    pub fn unload(&self, svc: &mut ServiceDescriptor) -> Result<Transition, ServiceError> {
        let logger = self.ctx.logger();
        log_trace!(logger, Facility::Service, "Unloading {}", svc.name);

        if svc.state.is_none() {
            log_error!(logger, Facility::Service, "Not loaded {}", svc.name);
            return Err(ServiceError::NotLoaded(svc.name));
        }

        let code = self.run_hook(svc, Hook::Unload);

        // Dropping the state returns its lease to the pool
        svc.state = None;

        log_info!(logger, Facility::Service, "Unloaded {}", svc.name);
        Ok(Transition::completed(svc.name, Hook::Unload, code))
    }

    /// Run `on_start` and set the started flag, whatever the hook reports
    pub fn start(&self, svc: &mut ServiceDescriptor) -> Result<Transition, ServiceError> {
        let logger = self.ctx.logger();
        log_trace!(logger, Facility::Service, "Starting {}", svc.name);

        match &svc.state {
            None => {
                log_error!(logger, Facility::Service, "Not loaded {}", svc.name);
                return Err(ServiceError::NotLoaded(svc.name));
            }
            Some(state) if state.started => {
                log_error!(logger, Facility::Service, "Already started {}", svc.name);
                return Err(ServiceError::AlreadyStarted(svc.name));
            }
            Some(_) => {}
        }

        let code = self.run_hook(svc, Hook::Start);
        if let Some(state) = svc.state.as_mut() {
            state.started = true;
        }

        log_info!(logger, Facility::Service, "Started {}", svc.name);
        Ok(Transition::completed(svc.name, Hook::Start, code))
    }

    /// Run `on_stop` and clear the started flag, whatever the hook reports
    pub fn stop(&self, svc: &mut ServiceDescriptor) -> Result<Transition, ServiceError> {
        let logger = self.ctx.logger();
        log_trace!(logger, Facility::Service, "Stopping {}", svc.name);

        match &svc.state {
            None => {
                log_error!(logger, Facility::Service, "Not loaded {}", svc.name);
                return Err(ServiceError::NotLoaded(svc.name));
            }
            Some(state) if !state.started => {
                log_error!(logger, Facility::Service, "Not started {}", svc.name);
                return Err(ServiceError::NotStarted(svc.name));
            }
            Some(_) => {}
        }

        let code = self.run_hook(svc, Hook::Stop);
        if let Some(state) = svc.state.as_mut() {
            state.started = false;
        }

        log_info!(logger, Facility::Service, "Stopped {}", svc.name);
        Ok(Transition::completed(svc.name, Hook::Stop, code))
    }

    /// Route a call to the service's dispatcher
    ///
    /// A service without a dispatcher accepts every call as a no-op. Whether
    /// the service must be started is up to the dispatcher.
    pub fn call(
        &self,
        svc: &mut ServiceDescriptor,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Result<Code, ServiceError> {
        let Some(dispatcher) = svc.iface.as_mut().and_then(|iface| iface.dispatcher()) else {
            return Ok(OK);
        };

        match dispatcher.on_call(&self.ctx, ordinal, arg_in, arg_out) {
            Some(code) => Ok(code),
            None => {
                log_error!(
                    self.ctx.logger(),
                    Facility::Service,
                    "{} has no handler for ordinal {}",
                    svc.name,
                    ordinal
                );
                Err(ServiceError::DispatchUnsupported {
                    service: svc.name,
                    ordinal,
                })
            }
        }
    }

    fn run_hook(&self, svc: &mut ServiceDescriptor, hook: Hook) -> Code {
        let Some(iface) = svc.iface.as_mut() else {
            return OK;
        };

        let code = match hook {
            Hook::Load => iface.on_load(&self.ctx),
            Hook::Unload => iface.on_unload(&self.ctx),
            Hook::Start => iface.on_start(&self.ctx),
            Hook::Stop => iface.on_stop(&self.ctx),
        };
        if code != OK {
            log_warn!(
                self.ctx.logger(),
                Facility::Service,
                "{} reported code {} during {}",
                svc.name,
                code,
                hook.as_str()
            );
        }
        code
    }
}
