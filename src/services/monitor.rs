// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Monitor service: a headless model of the monitor window
//!
//! | Ordinal      | Out                         |
//! |--------------|-----------------------------|
//! | `WIN_OPEN`   | -                           |
//! | `WIN_CLOSE`  | -                           |
//! | `WIN_UPDATE` | `Size` (frames so far)      |
//! | `WIN_QUERY`  | `Bool` (window still alive) |
//!
//! Every ordinal except `WIN_OPEN` needs an open window and returns 1
//! otherwise.

use crate::config::MonitorConfig;
use crate::logging::Facility;
use crate::service::{
    CallArg, Code, Dispatch, Ordinal, Service, ServiceContext, ServiceDescriptor, OK,
};
use crate::{log_debug, log_error, log_info, log_warn};
use std::time::{Duration, Instant};

pub const WIN_OPEN: Ordinal = 0;
pub const WIN_CLOSE: Ordinal = 1;
pub const WIN_UPDATE: Ordinal = 2;
pub const WIN_QUERY: Ordinal = 3;

#[derive(Debug)]
struct Window {
    width: u32,
    height: u32,
    frames: u64,
    max_frames: u64,
    frame_period: Duration,
    last_frame: Option<Instant>,
}

impl Window {
    fn open(config: &MonitorConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            frames: 0,
            max_frames: config.max_frames,
            frame_period: Duration::from_millis(config.frame_ms),
            last_frame: None,
        }
    }

    /// Present one frame, waiting out the rest of the frame period
    fn present(&mut self) {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.frame_period {
                std::thread::sleep(self.frame_period - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
        self.frames += 1;
    }

    /// Alive until the frame budget (if any) is spent
    fn should_close(&self) -> bool {
        self.max_frames != 0 && self.frames >= self.max_frames
    }
}

pub struct MonitorService {
    window: Option<Window>,
}

impl MonitorService {
    pub const NAME: &'static str = "monitor";
    pub const DESCRIPTION: &'static str =
        "The monitor service operates the monitor windows.";

    pub fn new() -> Self {
        Self { window: None }
    }

    pub fn descriptor(self) -> ServiceDescriptor {
        ServiceDescriptor::new(Self::NAME, Self::DESCRIPTION, self)
    }

    fn open(&mut self, ctx: &ServiceContext) -> Code {
        if self.window.is_some() {
            log_error!(ctx.logger(), Facility::Monitor, "Monitor window already open");
            return 1;
        }
        let config = &ctx.config().monitor;
        let window = Window::open(config);
        log_info!(
            ctx.logger(),
            Facility::Monitor,
            "Opened monitor window \"{}\" ({}x{})",
            config.title.as_str(),
            window.width,
            window.height
        );
        self.window = Some(window);
        OK
    }

    fn close(&mut self, ctx: &ServiceContext) -> Code {
        match self.window.take() {
            Some(window) => {
                log_info!(
                    ctx.logger(),
                    Facility::Monitor,
                    "Closed monitor window after {} frames",
                    window.frames
                );
                OK
            }
            None => {
                log_error!(ctx.logger(), Facility::Monitor, "Monitor window not yet open");
                1
            }
        }
    }
}

impl Default for MonitorService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for MonitorService {
    fn on_load(&mut self, ctx: &ServiceContext) -> Code {
        log_debug!(ctx.logger(), Facility::Monitor, "Window system initialized");
        OK
    }

    fn on_unload(&mut self, ctx: &ServiceContext) -> Code {
        if self.window.take().is_some() {
            log_warn!(ctx.logger(), Facility::Monitor, "A monitor window is still open");
        }
        log_debug!(ctx.logger(), Facility::Monitor, "Window system terminated");
        OK
    }

    fn dispatcher(&mut self) -> Option<&mut dyn Dispatch> {
        Some(self)
    }
}

impl Dispatch for MonitorService {
    fn on_call(
        &mut self,
        ctx: &ServiceContext,
        ordinal: Ordinal,
        _arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Option<Code> {
        let code = match ordinal {
            WIN_OPEN => self.open(ctx),
            WIN_CLOSE => self.close(ctx),
            WIN_UPDATE | WIN_QUERY => {
                let Some(window) = self.window.as_mut() else {
                    log_error!(ctx.logger(), Facility::Monitor, "Monitor window not yet open");
                    return Some(1);
                };
                if ordinal == WIN_UPDATE {
                    window.present();
                    *arg_out = CallArg::Size(window.frames as usize);
                } else {
                    *arg_out = CallArg::Bool(!window.should_close());
                }
                OK
            }
            _ => return None,
        };
        Some(code)
    }
}
