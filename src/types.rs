/*
 * Platform-agnostic value types used by the focus core, the router and the
 * Win32 backend. Native window handles travel through the core as
 * `NativeHandle`, an opaque integer that the backend converts to and from `HWND`
 * at the boundary, so the routing logic can be exercised without a desktop.
 */
use crate::messages::{KEY_DOWN_MASK, VK_MENU, VK_SHIFT, WM_KEYDOWN};

/// Opaque native window handle. Zero is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(pub usize);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Converts a possibly-null handle into an `Option`.
    pub fn non_null(self) -> Option<NativeHandle> {
        (!self.is_null()).then_some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn origin(&self) -> Point {
        Point {
            x: self.left,
            y: self.top,
        }
    }
}

/// Region in the target island's client coordinates that tells the embedded
/// runtime where focus is arriving from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HintRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One message retrieved from the thread's queue, carried in a form both the
/// core and the Win32 backend can read. Mirrors the fields of `MSG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputMessage {
    pub target: NativeHandle,
    pub message: u32,
    pub wparam: usize,
    pub lparam: isize,
    pub time: u32,
    pub cursor: Point,
}

impl InputMessage {
    pub fn new(target: NativeHandle, message: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            target,
            message,
            wparam,
            lparam,
            time: 0,
            cursor: Point::default(),
        }
    }

    /// Builds the key-down message used to replay a navigation through the
    /// native tab order.
    pub fn key_down(target: NativeHandle, virtual_key: u16) -> Self {
        Self::new(target, WM_KEYDOWN, virtual_key as usize, 0)
    }

    pub fn is_key_down(&self) -> bool {
        self.message == WM_KEYDOWN
    }

    pub fn virtual_key(&self) -> u16 {
        (self.wparam & 0xFFFF) as u16
    }
}

/// Snapshot of the thread keyboard state, as returned by `GetKeyboardState`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyboardState {
    keys: [u8; 256],
}

impl KeyboardState {
    pub fn from_raw(keys: [u8; 256]) -> Self {
        Self { keys }
    }

    pub fn is_down(&self, virtual_key: u16) -> bool {
        self.keys
            .get(virtual_key as usize)
            .is_some_and(|state| state & KEY_DOWN_MASK != 0)
    }

    pub fn shift_down(&self) -> bool {
        self.is_down(VK_SHIFT)
    }

    /// Alt is the menu modifier; while it is held menu accelerators must reach
    /// the native window even if an island owns focus.
    pub fn alt_down(&self) -> bool {
        self.is_down(VK_MENU)
    }

    pub fn with_key_down(mut self, virtual_key: u16) -> Self {
        if let Some(state) = self.keys.get_mut(virtual_key as usize) {
            *state |= KEY_DOWN_MASK;
        }
        self
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self { keys: [0; 256] }
    }
}

impl std::fmt::Debug for KeyboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardState")
            .field("shift", &self.shift_down())
            .field("alt", &self.alt_down())
            .finish()
    }
}

/// Application-wide settings for the host process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Used to derive the window class name.
    pub app_name: String,
    /// Dispatch whatever is left in the queue after the loop quits and before the
    /// embedded runtime is shut down.
    pub drain_queue_on_exit: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "IslandHost".to_string(),
            drain_queue_on_exit: true,
        }
    }
}

/// Settings for one top-level host window.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Island Host".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Per-island creation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IslandOptions {
    /// Native style bits OR-ed into the island window, typically `WS_TABSTOP` so
    /// the island takes part in the dialog tab order.
    pub extra_styles: u32,
}
