// SPDX-License-Identifier: Apache-2.0 OR MIT
// Service lifecycle and dispatch framework
//
// A service is a named unit with four lifecycle hooks and an optional
// ordinal-indexed dispatcher. The lifecycle controller drives a descriptor
// through load -> start -> stop -> unload and guards invalid transitions;
// hook results are advisory.

mod context;
mod dispatch;
mod error;
mod lifecycle;
mod registry;
mod state;
mod worker;

pub use context::ServiceContext;
pub use dispatch::CallArg;
pub use error::{status_code, Hook, ServiceError};
pub use lifecycle::{CallbackWarning, LifecycleController, Transition};
pub use registry::{BulkResult, ServiceRegistry};
pub use state::{PoolStats, ServiceState, StateLease, StatePool};
pub use worker::{KillSwitch, WorkerThread};

use std::fmt;

/// Result code of a hook or handler: 0 means success, nonzero is advisory
pub type Code = i32;

/// Index of an operation within one service's dispatcher
pub type Ordinal = u32;

pub const OK: Code = 0;

/// Lifecycle hooks implemented by every service
///
/// All hooks default to success, so a service only overrides what it uses.
pub trait Service: Send {
    fn on_load(&mut self, _ctx: &ServiceContext) -> Code {
        OK
    }

    fn on_unload(&mut self, _ctx: &ServiceContext) -> Code {
        OK
    }

    fn on_start(&mut self, _ctx: &ServiceContext) -> Code {
        OK
    }

    fn on_stop(&mut self, _ctx: &ServiceContext) -> Code {
        OK
    }

    /// The call dispatcher, if this service accepts calls
    fn dispatcher(&mut self) -> Option<&mut dyn Dispatch> {
        None
    }
}

/// Ordinal-indexed call handler
pub trait Dispatch {
    /// Run the handler for `ordinal`
    ///
    /// Returns `None` when no handler exists for the ordinal, otherwise the
    /// handler's code. `arg_in` is read-only; `arg_out` may be overwritten.
    fn on_call(
        &mut self,
        ctx: &ServiceContext,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Option<Code>;
}

/// Observable lifecycle position of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unloaded,
    Loaded,
    Started,
}

/// One registered service: identity, interface and framework-owned state
pub struct ServiceDescriptor {
    name: &'static str,
    description: &'static str,
    iface: Option<Box<dyn Service>>,
    state: Option<ServiceState>,
}

impl ServiceDescriptor {
    pub fn new<S: Service + 'static>(
        name: &'static str,
        description: &'static str,
        service: S,
    ) -> Self {
        Self {
            name,
            description,
            iface: Some(Box::new(service)),
            state: None,
        }
    }

    /// A descriptor without an interface: hooks are skipped, calls succeed
    pub fn bare(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            iface: None,
            state: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.state.as_ref().is_some_and(ServiceState::is_started)
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        match &self.state {
            None => LifecycleState::Unloaded,
            Some(state) if state.is_started() => LifecycleState::Started,
            Some(_) => LifecycleState::Loaded,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("has_iface", &self.iface.is_some())
            .field("state", &self.lifecycle_state())
            .finish()
    }
}
