/*
 * Seams to the two runtimes this crate sits between. The focus core only talks
 * to the native window system and to the process message queue through these
 * traits; `crate::win32` provides the real implementations and the unit tests
 * provide scripted ones.
 */
use crate::error::Result as PlatformResult;
use crate::types::{InputMessage, KeyboardState, NativeHandle, Point, Rect};

/// The native window operations the focus core needs.
pub trait NativeWindowing {
    /// Window that currently holds keyboard focus on this thread.
    fn focused(&self) -> Option<NativeHandle>;

    /// Moves keyboard focus. A failure here leaves focus in an undefined state
    /// and is propagated as fatal.
    fn set_focus(&self, handle: NativeHandle) -> PlatformResult<()>;

    /// Next (or previous) `WS_TABSTOP` control inside `root`, starting after
    /// `from`.
    fn next_tab_stop(
        &self,
        root: NativeHandle,
        from: Option<NativeHandle>,
        backward: bool,
    ) -> Option<NativeHandle>;

    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect>;

    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> PlatformResult<Point>;

    fn keyboard_state(&self) -> PlatformResult<KeyboardState>;

    /// Native dialog keyboard navigation (`IsDialogMessage`). Returns whether the
    /// message was handled.
    fn dialog_navigate(&self, root: NativeHandle, msg: &InputMessage) -> bool;

    /// ORs style bits into a window's `GWL_STYLE`.
    fn add_window_style(&self, handle: NativeHandle, style: u32) -> PlatformResult<()>;

    /// Asks the thread's queue to quit with the given exit code.
    fn post_quit(&self, exit_code: i32);
}

/// Synchronous message delivery to a window, used by the identity protocol.
pub trait MessageChannel {
    fn send_message(&self, target: NativeHandle, msg: u32, wparam: usize, lparam: isize) -> isize;
}

/// What the blocking retrieval step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieved {
    Message(InputMessage),
    Quit(i32),
}

/// The thread's message queue.
pub trait MessageQueue {
    /// Blocks until a message or the quit signal is available.
    fn next_message(&self) -> PlatformResult<Retrieved>;

    /// Default translate + dispatch for a message nobody claimed.
    fn translate_and_dispatch(&self, msg: &InputMessage);

    /// Dispatches everything still queued without blocking. Returns how many
    /// messages were drained.
    fn drain(&self) -> usize;
}

/// Process-level lifetime of the embedded UI runtime.
pub trait EmbeddedRuntime {
    fn shutdown(&self) -> PlatformResult<()>;
}

/// Reports a failure that reached the process boundary. Implementations block
/// until the user acknowledges it.
pub trait FatalNotifier {
    fn notify_fatal(&self, message: &str);
}
