/*
 * Hosts embedded declarative UI islands inside top-level Win32 windows and
 * makes keyboard focus flow between native controls and islands as one tab
 * order. The crate wires together the platform-agnostic focus core (navigation
 * state machine, island lifecycle, window identity protocol and message
 * routing) and the Windows-specific backend so a host application can treat it
 * as a single dependency.
 *
 * The embedded UI runtime itself is supplied by the host application through
 * the `IslandSource` and `EmbeddedRuntime` traits. Conditional compilation keeps
 * the portable pieces available on every platform so non-Windows builds can
 * still compile and test the focus logic.
 */
pub mod app;
pub mod error;
pub mod focus_navigator;
pub mod host_window;
pub mod identity;
pub mod island;
pub mod messages;
pub mod navigation;
pub mod platform;
pub mod router;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(test)]
mod test_support;

pub use app::{BOOTSTRAP_FAILURE_EXIT_CODE, FATAL_EXIT_CODE, IslandHostApp, run_guarded};
pub use error::{PlatformError, Result as PlatformResult};
pub use focus_navigator::{FocusNavigator, FocusState, NavigatorState};
pub use host_window::HostWindow;
pub use identity::OwnerToken;
pub use island::{EventToken, Island, IslandEvents, IslandHandle, IslandSource};
pub use navigation::{
    CorrelationId, NavigationDirection, NavigationReason, NavigationRequest, NavigationResult,
};
pub use platform::{
    EmbeddedRuntime, FatalNotifier, MessageChannel, MessageQueue, NativeWindowing, Retrieved,
};
pub use router::{MessageRouter, RouteOutcome};
pub use types::{
    AppConfig, HintRect, InputMessage, IslandOptions, KeyboardState, NativeHandle, Point, Rect,
    WindowConfig,
};
