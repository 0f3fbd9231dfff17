/*
 * `NativeWindowing` and `MessageChannel` over the real Win32 API, plus the
 * message-box fatal notifier. All calls act on the calling thread's windows;
 * the crate is single-threaded and never hands these across threads.
 */
use super::{from_hwnd, set_window_long_checked, to_hwnd, to_msg};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::platform::{FatalNotifier, MessageChannel, NativeWindowing};
use crate::types::{InputMessage, KeyboardState, NativeHandle, Point, Rect};

use windows::Win32::Foundation::{LPARAM, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetFocus, GetKeyboardState, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::{
    GWL_STYLE, GetNextDlgTabItem, GetWindowLongPtrW, GetWindowRect, IsDialogMessageW,
    MB_ICONERROR, MB_OK, MessageBoxW, PostQuitMessage, SendMessageW,
};
use windows::core::HSTRING;

#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Windowing;

impl NativeWindowing for Win32Windowing {
    fn focused(&self) -> Option<NativeHandle> {
        from_hwnd(unsafe { GetFocus() }).non_null()
    }

    fn set_focus(&self, handle: NativeHandle) -> PlatformResult<()> {
        let hwnd = to_hwnd(handle);
        // SetFocus reports the previously focused window; a null previous focus
        // surfaces as an error even though the call succeeded.
        if let Err(err) = unsafe { SetFocus(Some(hwnd)) } {
            if unsafe { GetFocus() } != hwnd {
                log::error!("Win32Windowing: SetFocus({handle:?}) failed: {err:?}");
                return Err(PlatformError::FocusTransferFailed(format!(
                    "SetFocus({handle:?}) failed: {err}"
                )));
            }
        }
        Ok(())
    }

    fn next_tab_stop(
        &self,
        root: NativeHandle,
        from: Option<NativeHandle>,
        backward: bool,
    ) -> Option<NativeHandle> {
        unsafe { GetNextDlgTabItem(to_hwnd(root), from.map(to_hwnd), backward) }
            .ok()
            .map(from_hwnd)
            .and_then(NativeHandle::non_null)
    }

    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(to_hwnd(handle), &mut rect) }?;
        Ok(Rect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> PlatformResult<Point> {
        let mut native = POINT {
            x: point.x,
            y: point.y,
        };
        if !unsafe { ScreenToClient(to_hwnd(handle), &mut native) }.as_bool() {
            return Err(PlatformError::OperationFailed(format!(
                "ScreenToClient({handle:?}) failed"
            )));
        }
        Ok(Point {
            x: native.x,
            y: native.y,
        })
    }

    fn keyboard_state(&self) -> PlatformResult<KeyboardState> {
        let mut keys = [0u8; 256];
        unsafe { GetKeyboardState(&mut keys) }?;
        Ok(KeyboardState::from_raw(keys))
    }

    fn dialog_navigate(&self, root: NativeHandle, msg: &InputMessage) -> bool {
        let native = to_msg(msg);
        unsafe { IsDialogMessageW(to_hwnd(root), &native) }.as_bool()
    }

    fn add_window_style(&self, handle: NativeHandle, style: u32) -> PlatformResult<()> {
        let hwnd = to_hwnd(handle);
        let current = unsafe { GetWindowLongPtrW(hwnd, GWL_STYLE) };
        set_window_long_checked(hwnd, GWL_STYLE, current | style as isize)?;
        Ok(())
    }

    fn post_quit(&self, exit_code: i32) {
        unsafe { PostQuitMessage(exit_code) };
    }
}

impl MessageChannel for Win32Windowing {
    fn send_message(&self, target: NativeHandle, msg: u32, wparam: usize, lparam: isize) -> isize {
        unsafe {
            SendMessageW(
                to_hwnd(target),
                msg,
                Some(WPARAM(wparam)),
                Some(LPARAM(lparam)),
            )
        }
        .0
    }
}

/// Reports fatal errors in a blocking error message box.
#[derive(Debug, Clone)]
pub struct MessageBoxNotifier {
    caption: String,
}

impl MessageBoxNotifier {
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
        }
    }
}

impl FatalNotifier for MessageBoxNotifier {
    fn notify_fatal(&self, message: &str) {
        unsafe {
            MessageBoxW(
                None,
                &HSTRING::from(message),
                &HSTRING::from(self.caption.as_str()),
                MB_OK | MB_ICONERROR,
            );
        }
    }
}
