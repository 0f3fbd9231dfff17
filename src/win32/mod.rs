/*
 * Win32 backend. Implements the collaborator traits from `crate::platform` on
 * top of the `windows` crate and owns the host window class and its window
 * procedure. Everything in here converts between the portable types
 * (`NativeHandle`, `InputMessage`) and their Win32 counterparts at the boundary;
 * no `HWND` or `MSG` leaks into the focus core.
 */
pub mod message_loop;
pub mod window;
pub mod windowing;

pub use message_loop::Win32MessageQueue;
pub use window::{create_host_window, discover_thread_windows};
pub use windowing::{MessageBoxNotifier, Win32Windowing};

use crate::app::IslandHostApp;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{InputMessage, NativeHandle, Point};

use windows::Win32::Foundation::{
    GetLastError, HWND, LPARAM, POINT, SetLastError, WIN32_ERROR, WPARAM,
};
use windows::Win32::UI::WindowsAndMessaging::{
    MSG, SetWindowLongPtrW, WINDOW_LONG_PTR_INDEX,
};

use std::ffi::c_void;

#[inline]
pub(crate) fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

#[inline]
pub(crate) fn from_hwnd(hwnd: HWND) -> NativeHandle {
    NativeHandle(hwnd.0 as usize)
}

pub(crate) fn from_msg(msg: &MSG) -> InputMessage {
    InputMessage {
        target: from_hwnd(msg.hwnd),
        message: msg.message,
        wparam: msg.wParam.0,
        lparam: msg.lParam.0,
        time: msg.time,
        cursor: Point {
            x: msg.pt.x,
            y: msg.pt.y,
        },
    }
}

pub(crate) fn to_msg(msg: &InputMessage) -> MSG {
    MSG {
        hwnd: to_hwnd(msg.target),
        message: msg.message,
        wParam: WPARAM(msg.wparam),
        lParam: LPARAM(msg.lparam),
        time: msg.time,
        pt: POINT {
            x: msg.cursor.x,
            y: msg.cursor.y,
        },
        ..Default::default()
    }
}

/*
 * `SetWindowLongPtrW` returns the previous value, so zero is ambiguous. The
 * thread error is reset first and checked afterwards to tell a genuine failure
 * from a previous value of zero.
 */
pub(crate) fn set_window_long_checked(
    hwnd: HWND,
    index: WINDOW_LONG_PTR_INDEX,
    value: isize,
) -> PlatformResult<isize> {
    unsafe {
        SetLastError(WIN32_ERROR(0));
        let previous = SetWindowLongPtrW(hwnd, index, value);
        let error = GetLastError();
        if previous == 0 && error.0 != 0 {
            log::error!("Win32: SetWindowLongPtrW({index:?}) failed: {error:?}");
            return Err(PlatformError::OperationFailed(format!(
                "SetWindowLongPtrW failed: {error:?}"
            )));
        }
        Ok(previous)
    }
}

/*
 * Standard Win32 entry: adopts host windows that already exist on this thread,
 * then runs the app's pump on the thread queue. Used as the body passed to
 * `run_guarded`.
 */
pub fn run_app(app: IslandHostApp) -> PlatformResult<i32> {
    let adopted = discover_thread_windows(app.router(), &Win32Windowing);
    if adopted > 0 {
        log::debug!("Win32: adopted {adopted} existing host windows");
    }
    app.run(&Win32MessageQueue)
}
