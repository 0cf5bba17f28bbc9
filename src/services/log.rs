// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Log service: the log ring behind the service call contract
//!
//! | Ordinal         | In              | Out                       |
//! |-----------------|-----------------|---------------------------|
//! | `SUBMIT`        | `Record`        | `Bool` (accepted)         |
//! | `RING_READ`     | -               | `Text` or `Empty`         |
//! | `RING_CAPACITY` | -               | `Size`                    |
//! | `RING_SIZE`     | -               | `Size`                    |

use crate::logging::{render, Facility, LogFormat};
use crate::service::{
    CallArg, Code, Dispatch, Ordinal, Service, ServiceContext, ServiceDescriptor, OK,
};
use crate::log_error;

pub const SUBMIT: Ordinal = 0;
pub const RING_READ: Ordinal = 1;
pub const RING_CAPACITY: Ordinal = 2;
pub const RING_SIZE: Ordinal = 3;

pub struct LogService {
    /// Set when this service drains the ring itself
    reader: Option<LogFormat>,
}

impl LogService {
    pub const NAME: &'static str = "log";
    pub const DESCRIPTION: &'static str =
        "The log service accepts records from other services and reports on the log ring.";

    /// A log service for a ring drained by a background consumer
    ///
    /// `RING_READ` is refused.
    pub fn new() -> Self {
        Self { reader: None }
    }

    /// A log service that owns the consumer side of the ring
    ///
    /// `RING_READ` renders one record per call in `format`. Do not combine
    /// with a running pipeline consumer.
    pub fn with_reader(format: LogFormat) -> Self {
        Self {
            reader: Some(format),
        }
    }

    pub fn descriptor(self) -> ServiceDescriptor {
        ServiceDescriptor::new(Self::NAME, Self::DESCRIPTION, self)
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for LogService {
    fn dispatcher(&mut self) -> Option<&mut dyn Dispatch> {
        Some(self)
    }
}

impl Dispatch for LogService {
    fn on_call(
        &mut self,
        ctx: &ServiceContext,
        ordinal: Ordinal,
        arg_in: &CallArg,
        arg_out: &mut CallArg,
    ) -> Option<Code> {
        let logger = ctx.logger();
        let code = match ordinal {
            SUBMIT => {
                let Some(record) = arg_in.as_record() else {
                    log_error!(logger, Facility::Log, "Submit expects a record argument");
                    return Some(1);
                };
                let accepted = logger.submit(record.clone()).is_ok();
                *arg_out = CallArg::Bool(accepted);
                if accepted {
                    OK
                } else {
                    1
                }
            }
            RING_READ => {
                let Some(format) = self.reader else {
                    log_error!(logger, Facility::Log, "The log ring is drained by a background consumer");
                    return Some(1);
                };
                *arg_out = match logger.ring().pop() {
                    Some(record) => CallArg::Text(render(&record, format)),
                    None => CallArg::Empty,
                };
                OK
            }
            RING_CAPACITY => {
                *arg_out = CallArg::Size(logger.ring_capacity());
                OK
            }
            RING_SIZE => {
                *arg_out = CallArg::Size(logger.ring_size());
                OK
            }
            _ => return None,
        };
        Some(code)
    }
}
