// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::config::ServicesConfig;
use crate::context::ProcessContext;
use crate::logging::Logger;
use std::sync::Arc;

/// Everything a service hook or dispatcher may need from its host
///
/// Passed explicitly to every hook instead of living in process globals.
#[derive(Clone)]
pub struct ServiceContext {
    logger: Logger,
    process: Arc<ProcessContext>,
    config: Arc<ServicesConfig>,
}

impl ServiceContext {
    pub fn new(logger: Logger, process: Arc<ProcessContext>, config: Arc<ServicesConfig>) -> Self {
        Self {
            logger,
            process,
            config,
        }
    }

    /// Context with an empty process view and default service settings
    pub fn with_logger(logger: Logger) -> Self {
        Self::new(
            logger,
            ProcessContext::empty(),
            Arc::new(ServicesConfig::default()),
        )
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn process(&self) -> &ProcessContext {
        &self.process
    }

    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }
}
