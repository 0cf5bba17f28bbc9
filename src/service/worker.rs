// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Cooperative worker threads owned by services
//!
//! The worker body polls a [`KillSwitch`] once per loop iteration. Stopping
//! sets the switch and joins; there is no forced cancellation and no join
//! timeout.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Shared stop flag checked by a worker loop
#[derive(Debug, Clone, Default)]
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A named OS thread with a kill switch
#[derive(Debug)]
pub struct WorkerThread {
    name: String,
    kill_switch: KillSwitch,
    handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    /// Spawn `body` on a new thread; it receives the switch to poll
    pub fn spawn<F>(name: impl Into<String>, body: F) -> io::Result<Self>
    where
        F: FnOnce(KillSwitch) + Send + 'static,
    {
        let name = name.into();
        let kill_switch = KillSwitch::new();
        let worker_switch = kill_switch.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(worker_switch))?;

        Ok(Self {
            name,
            kill_switch,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the body already returned on its own
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Set the kill switch and wait for the thread to exit
    ///
    /// Returns `Err` if the worker panicked.
    pub fn stop(mut self) -> thread::Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> thread::Result<()> {
        self.kill_switch.set();
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
