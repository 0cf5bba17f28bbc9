// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Service lifecycle scenarios driven through the public API.
//!
//! Records are read back through a capturing sink on a real log pipeline,
//! so the log lines checked here are exactly what an operator would see.

use cozmonaut::logging::{LogFormat, LogLevels, LogPipeline, LogSink, Logger, Severity};
use cozmonaut::service::{
    status_code, CallArg, Code, Dispatch, LifecycleController, LifecycleState, Ordinal, Service,
    ServiceContext, ServiceDescriptor, ServiceError, ServiceRegistry, StatePool, Transition, OK,
};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<String>>>);

impl LogSink for SharedSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.0.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn pipeline() -> (LogPipeline, SharedSink) {
    let sink = SharedSink::default();
    let pipeline = LogPipeline::with_sink(
        1024,
        LogLevels::new(Severity::Debug),
        Box::new(sink.clone()),
        LogFormat::Text,
        Duration::from_millis(1),
    )
    .unwrap();
    (pipeline, sink)
}

fn quiet_controller(slots: usize) -> LifecycleController {
    LifecycleController::new(
        ServiceContext::with_logger(Logger::with_capacity(256)),
        StatePool::new(slots),
    )
}

type Step = fn(&LifecycleController, &mut ServiceDescriptor) -> Result<Transition, ServiceError>;

/// Counts hook invocations; every hook returns `code`
#[derive(Default)]
struct Counter {
    hooks: Arc<AtomicUsize>,
    code: Code,
}

impl Service for Counter {
    fn on_load(&mut self, _: &ServiceContext) -> Code {
        self.hooks.fetch_add(1, Ordering::Relaxed);
        self.code
    }

    fn on_unload(&mut self, _: &ServiceContext) -> Code {
        self.hooks.fetch_add(1, Ordering::Relaxed);
        self.code
    }

    fn on_start(&mut self, _: &ServiceContext) -> Code {
        self.hooks.fetch_add(1, Ordering::Relaxed);
        self.code
    }

    fn on_stop(&mut self, _: &ServiceContext) -> Code {
        self.hooks.fetch_add(1, Ordering::Relaxed);
        self.code
    }

    fn dispatcher(&mut self) -> Option<&mut dyn Dispatch> {
        Some(self)
    }
}

impl Dispatch for Counter {
    fn on_call(
        &mut self,
        _: &ServiceContext,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Option<Code> {
        match ordinal {
            0 => {
                *arg_out = CallArg::Int(arg_in.as_int().unwrap_or(0) * 2);
                Some(42)
            }
            _ => None,
        }
    }
}

#[test]
fn test_full_lifecycle_scenario() {
    let (pipeline, sink) = pipeline();
    let ctx = ServiceContext::with_logger(pipeline.logger());
    let ctl = LifecycleController::new(ctx, StatePool::new(4));
    let mut svc = ServiceDescriptor::new("x", "The x service does x.", Counter::default());

    assert_eq!(status_code(&ctl.load(&mut svc)), OK);
    assert_eq!(ctl.load(&mut svc).unwrap_err(), ServiceError::AlreadyLoaded("x"));
    assert_eq!(ctl.pool().in_use(), 1);

    assert_eq!(status_code(&ctl.start(&mut svc)), OK);
    assert_eq!(svc.lifecycle_state(), LifecycleState::Started);

    let mut out = CallArg::Empty;
    assert_eq!(ctl.call(&mut svc, 0, &CallArg::Int(21), &mut out), Ok(42));
    assert_eq!(out, CallArg::Int(42));

    assert_eq!(status_code(&ctl.stop(&mut svc)), OK);
    assert_eq!(ctl.stop(&mut svc).unwrap_err(), ServiceError::NotStarted("x"));
    assert_eq!(status_code(&ctl.unload(&mut svc)), OK);
    assert_eq!(svc.lifecycle_state(), LifecycleState::Unloaded);
    assert_eq!(ctl.pool().in_use(), 0);

    pipeline.shutdown();
    let lines = sink.0.lock().unwrap().clone();
    let expected = [
        "Loaded x",
        "The x service does x.",
        "Already loaded x",
        "Started x",
        "Stopped x",
        "Not started x",
        "Unloaded x",
    ];
    let mut cursor = lines.iter();
    for needle in expected {
        assert!(
            cursor.any(|line| line.ends_with(needle)),
            "missing or out of order: {needle}\n{lines:#?}"
        );
    }
    assert!(lines[0].starts_with("[INFO] [Service]"));
}

#[test]
fn test_invalid_transitions() {
    let ctl = quiet_controller(1);
    let mut svc = ServiceDescriptor::new("y", "y", Counter::default());

    assert_eq!(ctl.start(&mut svc).unwrap_err(), ServiceError::NotLoaded("y"));
    assert_eq!(ctl.stop(&mut svc).unwrap_err(), ServiceError::NotLoaded("y"));
    assert_eq!(ctl.unload(&mut svc).unwrap_err(), ServiceError::NotLoaded("y"));

    ctl.load(&mut svc).unwrap();
    assert_eq!(ctl.stop(&mut svc).unwrap_err(), ServiceError::NotStarted("y"));
    ctl.start(&mut svc).unwrap();
    assert_eq!(ctl.start(&mut svc).unwrap_err(), ServiceError::AlreadyStarted("y"));
    assert_eq!(ctl.pool().in_use(), 1);
}

#[test]
fn test_failing_hooks_are_advisory() {
    let hooks = Arc::new(AtomicUsize::new(0));
    let ctl = quiet_controller(1);
    let mut svc = ServiceDescriptor::new(
        "z",
        "z",
        Counter {
            hooks: Arc::clone(&hooks),
            code: 5,
        },
    );

    let steps: [Step; 4] = [
        LifecycleController::load,
        LifecycleController::start,
        LifecycleController::stop,
        LifecycleController::unload,
    ];
    for step in steps {
        let transition = step(&ctl, &mut svc).unwrap();
        assert!(!transition.is_clean());
        assert_eq!(transition.warning().map(|w| w.code), Some(5));
    }
    assert_eq!(hooks.load(Ordering::Relaxed), 4);

    // unload freed the state despite the nonzero code; a fresh load works
    assert_eq!(ctl.pool().in_use(), 0);
    let err = ctl.load(&mut svc).unwrap().strict().unwrap_err();
    assert!(matches!(err, ServiceError::CallbackWarning { code: 5, .. }));
    assert_eq!(err.code(), 7);
    assert_eq!(ctl.pool().stats().releases_total, 1);
}

#[test]
fn test_unknown_ordinal_and_missing_dispatcher() {
    let ctl = quiet_controller(2);
    let mut svc = ServiceDescriptor::new("x", "x", Counter::default());
    let mut out = CallArg::Empty;

    assert_eq!(
        ctl.call(&mut svc, 9, &CallArg::Empty, &mut out),
        Err(ServiceError::DispatchUnsupported {
            service: "x",
            ordinal: 9
        })
    );

    let mut bare = ServiceDescriptor::bare("empty", "no interface");
    ctl.load(&mut bare).unwrap();
    ctl.start(&mut bare).unwrap();
    assert_eq!(ctl.call(&mut bare, 0, &CallArg::Empty, &mut out), Ok(OK));
    assert!(out.is_empty());
}

#[test]
fn test_registry_ordering_and_pool_exhaustion() {
    let (pipeline, sink) = pipeline();
    let ctx = ServiceContext::with_logger(pipeline.logger());
    let mut registry = ServiceRegistry::new(LifecycleController::new(ctx, StatePool::new(2)));
    for name in ["a", "b", "c"] {
        registry
            .register(ServiceDescriptor::new(name, name, Counter::default()))
            .unwrap();
    }
    assert_eq!(
        registry.register(ServiceDescriptor::bare("a", "again")),
        Err(ServiceError::DuplicateService("a"))
    );

    let loaded = registry.load_all();
    assert!(loaded[0].1.is_ok() && loaded[1].1.is_ok());
    assert_eq!(
        loaded[2].1,
        Err(ServiceError::AllocationFailure {
            service: "c",
            capacity: 2
        })
    );

    let started = registry.start_all();
    assert_eq!(started[2].1, Err(ServiceError::NotLoaded("c")));

    let stopped = registry.shutdown();
    let names: Vec<_> = stopped.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["b", "a", "b", "a"]);
    assert!(stopped.iter().all(|(_, result)| result.is_ok()));
    assert!(registry.get("a").is_some_and(|svc| !svc.is_loaded()));
    assert!(matches!(
        registry.load("nope"),
        Err(ServiceError::UnknownService(ref name)) if name == "nope"
    ));

    pipeline.shutdown();
    let lines = sink.0.lock().unwrap();
    assert!(lines
        .iter()
        .any(|l| l.contains("[ERROR]") && l.ends_with("State allocation failed for c (2 slots in use)")));
}
