/*
 * Ownership root of a hosting process. `IslandHostApp` is constructed once at
 * process entry and owns the router, the native windowing backend and the
 * embedded runtime's process-level lifetime. It is passed explicitly to the
 * code that creates windows instead of being reachable through a global.
 *
 * Shutdown order after the pump quits: drain the queue, then shut the embedded
 * runtime down. Messages delivered after the runtime is gone would reach
 * half-destroyed islands.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host_window::HostWindow;
use crate::platform::{EmbeddedRuntime, FatalNotifier, MessageQueue, NativeWindowing};
use crate::router::MessageRouter;
use crate::types::AppConfig;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

/// Exit status when an error or panic reaches the process boundary.
pub const FATAL_EXIT_CODE: i32 = -1;
/// Exit status when the embedded runtime could not be brought up.
pub const BOOTSTRAP_FAILURE_EXIT_CODE: i32 = -255;

pub struct IslandHostApp {
    config: AppConfig,
    router: Rc<MessageRouter>,
    windowing: Rc<dyn NativeWindowing>,
    runtime: Option<Box<dyn EmbeddedRuntime>>,
}

impl IslandHostApp {
    pub fn new(
        config: AppConfig,
        windowing: Rc<dyn NativeWindowing>,
        runtime: Box<dyn EmbeddedRuntime>,
    ) -> Self {
        log::debug!("IslandHostApp: created for '{}'", config.app_name);
        Self {
            config,
            router: MessageRouter::new(),
            windowing,
            runtime: Some(runtime),
        }
    }

    /*
     * Starts the embedded runtime and builds the app around it. A runtime that
     * fails to start is reported as `InitializationFailed`, which
     * `run_guarded` maps to `BOOTSTRAP_FAILURE_EXIT_CODE`.
     */
    pub fn bootstrap<F>(
        config: AppConfig,
        windowing: Rc<dyn NativeWindowing>,
        start_runtime: F,
    ) -> PlatformResult<Self>
    where
        F: FnOnce() -> PlatformResult<Box<dyn EmbeddedRuntime>>,
    {
        let runtime = start_runtime().map_err(|err| {
            log::error!("IslandHostApp: embedded runtime failed to start: {err}");
            match err {
                PlatformError::InitializationFailed(_) => err,
                other => PlatformError::InitializationFailed(format!(
                    "embedded runtime failed to start: {other}"
                )),
            }
        })?;
        Ok(Self::new(config, windowing, runtime))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> &Rc<MessageRouter> {
        &self.router
    }

    pub fn windowing(&self) -> &Rc<dyn NativeWindowing> {
        &self.windowing
    }

    /// Creates the window object; the native window is created by the backend
    /// (`win32::window::create_host_window`), which registers it on creation.
    pub fn new_host_window(&self, is_main: bool) -> Rc<HostWindow> {
        HostWindow::new(&self.router, Rc::clone(&self.windowing), is_main)
    }

    /*
     * Runs the message pump to completion and then shuts down. The shutdown
     * steps run even when the pump fails; the pump's error wins over a
     * shutdown error.
     */
    pub fn run(mut self, queue: &dyn MessageQueue) -> PlatformResult<i32> {
        let pumped = self.router.run(queue);
        let shut_down = self.shutdown(queue);
        let exit_code = pumped?;
        shut_down?;
        Ok(exit_code)
    }

    fn shutdown(&mut self, queue: &dyn MessageQueue) -> PlatformResult<()> {
        if self.config.drain_queue_on_exit {
            let drained = queue.drain();
            log::debug!("IslandHostApp: drained {drained} queued messages");
        }
        match self.runtime.take() {
            Some(runtime) => runtime.shutdown(),
            None => Ok(()),
        }
    }
}

impl Drop for IslandHostApp {
    fn drop(&mut self) {
        if self.runtime.is_some() {
            log::warn!("IslandHostApp: dropped without running; embedded runtime not shut down");
        }
    }
}

impl std::fmt::Debug for IslandHostApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IslandHostApp")
            .field("config", &self.config)
            .field("router", &self.router)
            .finish()
    }
}

/*
 * Process boundary guard. Runs `body`; an error or a panic is reported to the
 * user through `notifier` (which blocks) and mapped to an exit status:
 * `BOOTSTRAP_FAILURE_EXIT_CODE` for initialization failures, `FATAL_EXIT_CODE`
 * for everything else.
 */
pub fn run_guarded<F>(notifier: &dyn FatalNotifier, body: F) -> i32
where
    F: FnOnce() -> PlatformResult<i32>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(exit_code)) => exit_code,
        Ok(Err(err)) => {
            log::error!("IslandHostApp: terminating on error: {err}");
            notifier.notify_fatal(&format!("The application must close: {err}"));
            match err {
                PlatformError::InitializationFailed(_) => BOOTSTRAP_FAILURE_EXIT_CODE,
                _ => FATAL_EXIT_CODE,
            }
        }
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("IslandHostApp: terminating on panic: {detail}");
            notifier.notify_fatal(&format!("The application must close: {detail}"));
            FATAL_EXIT_CODE
        }
    }
}
