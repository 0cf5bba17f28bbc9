// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Service registry
//!
//! Holds descriptors in registration order. Bulk operations bring services
//! up in that order and tear them down in reverse, continuing past
//! individual failures.

use super::{
    CallArg, Code, LifecycleController, Ordinal, ServiceDescriptor, ServiceError, Transition,
};

/// Per-service result of a bulk operation
pub type BulkResult = Vec<(&'static str, Result<Transition, ServiceError>)>;

pub struct ServiceRegistry {
    controller: LifecycleController,
    services: Vec<ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn new(controller: LifecycleController) -> Self {
        Self {
            controller,
            services: Vec::new(),
        }
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Add a descriptor; names must be unique
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> Result<(), ServiceError> {
        if self.position(descriptor.name()).is_some() {
            return Err(ServiceError::DuplicateService(descriptor.name()));
        }
        self.services.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|svc| svc.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.services.iter().map(ServiceDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn load(&mut self, name: &str) -> Result<Transition, ServiceError> {
        let idx = self.index(name)?;
        self.controller.load(&mut self.services[idx])
    }

    pub fn unload(&mut self, name: &str) -> Result<Transition, ServiceError> {
        let idx = self.index(name)?;
        self.controller.unload(&mut self.services[idx])
    }

    pub fn start(&mut self, name: &str) -> Result<Transition, ServiceError> {
        let idx = self.index(name)?;
        self.controller.start(&mut self.services[idx])
    }

    pub fn stop(&mut self, name: &str) -> Result<Transition, ServiceError> {
        let idx = self.index(name)?;
        self.controller.stop(&mut self.services[idx])
    }

    pub fn call(
        &mut self,
        name: &str,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Result<Code, ServiceError> {
        let idx = self.index(name)?;
        self.controller
            .call(&mut self.services[idx], ordinal, arg_in, arg_out)
    }

    /// Load every service in registration order
    pub fn load_all(&mut self) -> BulkResult {
        self.services
            .iter_mut()
            .map(|svc| (svc.name(), self.controller.load(svc)))
            .collect()
    }

    /// Start every service in registration order
    pub fn start_all(&mut self) -> BulkResult {
        self.services
            .iter_mut()
            .map(|svc| (svc.name(), self.controller.start(svc)))
            .collect()
    }

    /// Stop every service in reverse registration order
    pub fn stop_all(&mut self) -> BulkResult {
        self.services
            .iter_mut()
            .rev()
            .map(|svc| (svc.name(), self.controller.stop(svc)))
            .collect()
    }

    /// Unload every service in reverse registration order
    pub fn unload_all(&mut self) -> BulkResult {
        self.services
            .iter_mut()
            .rev()
            .map(|svc| (svc.name(), self.controller.unload(svc)))
            .collect()
    }

    /// Stop whatever is started, then unload whatever is loaded
    pub fn shutdown(&mut self) -> BulkResult {
        let mut results = Vec::new();
        for svc in self.services.iter_mut().rev() {
            if svc.is_started() {
                results.push((svc.name(), self.controller.stop(svc)));
            }
        }
        for svc in self.services.iter_mut().rev() {
            if svc.is_loaded() {
                results.push((svc.name(), self.controller.unload(svc)));
            }
        }
        results
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.services.iter().position(|svc| svc.name() == name)
    }

    fn index(&self, name: &str) -> Result<usize, ServiceError> {
        self.position(name)
            .ok_or_else(|| ServiceError::UnknownService(name.to_string()))
    }
}
