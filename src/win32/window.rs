/*
 * Host window class registration, window creation and the window procedure.
 *
 * Each native window carries a heap-allocated `WindowContext` in its
 * `GWLP_USERDATA` slot. The context is handed over through `lpCreateParams`,
 * stored at `WM_NCCREATE` and freed at `WM_NCDESTROY`. Its address doubles as
 * the owner address the window publishes over the identity protocol.
 */
use super::{from_hwnd, set_window_long_checked};
use crate::app::IslandHostApp;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host_window::HostWindow;
use crate::messages::WM_NCDESTROY;
use crate::platform::MessageChannel;
use crate::router::MessageRouter;
use crate::types::{NativeHandle, WindowConfig};

use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{COLOR_WINDOW, HBRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW,
    EnumThreadWindows, GWLP_USERDATA, GetClassInfoExW, GetWindowLongPtrW, IDC_ARROW,
    LoadCursorW, RegisterClassExW, SW_SHOW, ShowWindow,
    WINDOW_EX_STYLE, WM_NCCREATE, WNDCLASSEXW, WS_CLIPCHILDREN, WS_OVERLAPPEDWINDOW,
};
use windows::core::{BOOL, HSTRING, PCWSTR};

use std::cell::Cell;
use std::ffi::c_void;
use std::rc::Rc;

/// Per-window state owned by the native window between `WM_NCCREATE` and
/// `WM_NCDESTROY`.
struct WindowContext {
    host: Rc<HostWindow>,
}

/*
 * Lives on the creator's stack for the duration of `CreateWindowExW`. The
 * window procedure takes the context out at `WM_NCCREATE`; if creation fails
 * before that, the context is still here and is dropped with the request.
 */
struct CreationRequest {
    context: Cell<Option<Box<WindowContext>>>,
}

fn class_name(app_name: &str) -> HSTRING {
    HSTRING::from(format!("{app_name}_IslandHostWindowClass"))
}

fn module_instance() -> PlatformResult<HINSTANCE> {
    let module = unsafe { GetModuleHandleW(None) }?;
    Ok(module.into())
}

/*
 * Ensures the app's host window class exists and returns its name. Every host
 * window of one app shares the class and `host_wnd_proc`; the class is
 * registered by whichever window is created first.
 */
fn ensure_window_class(app_name: &str, instance: HINSTANCE) -> PlatformResult<HSTRING> {
    let name = class_name(app_name);
    let mut existing = WNDCLASSEXW::default();
    if unsafe { GetClassInfoExW(Some(instance), &name, &mut existing) }.is_ok() {
        return Ok(name);
    }

    let class = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(host_wnd_proc),
        hInstance: instance,
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }?,
        hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as *mut c_void),
        lpszClassName: PCWSTR(name.as_ptr()),
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        let error = unsafe { GetLastError() };
        log::error!("Win32: registering host window class {name} failed: {error:?}");
        return Err(PlatformError::InitializationFailed(format!(
            "host window class {name}: {error:?}"
        )));
    }
    log::debug!("Win32: registered host window class {name}");
    Ok(name)
}

/*
 * Creates and shows a top-level host window. The returned `HostWindow` is
 * already bound to its native handle and registered with the app's router.
 */
pub fn create_host_window(
    app: &IslandHostApp,
    config: &WindowConfig,
    is_main: bool,
) -> PlatformResult<Rc<HostWindow>> {
    let instance = module_instance()?;
    let class = ensure_window_class(&app.config().app_name, instance)?;
    let host = app.new_host_window(is_main);
    let request = CreationRequest {
        context: Cell::new(Some(Box::new(WindowContext {
            host: Rc::clone(&host),
        }))),
    };

    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            &class,
            &HSTRING::from(config.title.as_str()),
            WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            config.width,
            config.height,
            None,
            None,
            Some(instance),
            Some(&request as *const CreationRequest as *const c_void),
        )
    }
    .inspect_err(|err| log::error!("Win32: CreateWindowExW failed: {err:?}"))?;

    let _ = unsafe { ShowWindow(hwnd, SW_SHOW) };
    log::debug!("Win32: created host window {:?} '{}'", from_hwnd(hwnd), config.title);
    Ok(host)
}

/*
 * Takes ownership of the context at `WM_NCCREATE`. Returns false, which makes
 * `CreateWindowExW` fail, when the context cannot be stored or the host refuses
 * the association.
 */
unsafe fn attach_context(hwnd: HWND, lparam: LPARAM) -> bool {
    let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
    let request_ptr = create_struct.lpCreateParams as *const CreationRequest;
    if request_ptr.is_null() {
        log::error!("Win32: WM_NCCREATE without creation parameters");
        return false;
    }
    let Some(context) = unsafe { &*request_ptr }.context.take() else {
        log::error!("Win32: creation context already consumed");
        return false;
    };

    let host = Rc::clone(&context.host);
    let context_ptr = Box::into_raw(context);
    let stored = set_window_long_checked(hwnd, GWLP_USERDATA, context_ptr as isize)
        .and_then(|_| host.on_native_created(from_hwnd(hwnd), context_ptr as usize));

    match stored {
        Ok(_) => true,
        Err(err) => {
            log::error!("Win32: host window association failed: {err}");
            let _ = set_window_long_checked(hwnd, GWLP_USERDATA, 0);
            drop(unsafe { Box::from_raw(context_ptr) });
            false
        }
    }
}

unsafe extern "system" fn host_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_NCCREATE && !unsafe { attach_context(hwnd, lparam) } {
        return LRESULT(0);
    }

    let context_ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut WindowContext;
    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    // Cloned so a nested WM_NCDESTROY freeing the context cannot invalidate it.
    let host = Rc::clone(&unsafe { &*context_ptr }.host);

    let result = match host.handle_message(msg, wparam.0, lparam.0) {
        Ok(Some(reply)) => LRESULT(reply),
        Ok(None) => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        Err(err) => {
            host.defer_fatal(err);
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
    };

    if msg == WM_NCDESTROY {
        let _ = set_window_long_checked(hwnd, GWLP_USERDATA, 0);
        drop(unsafe { Box::from_raw(context_ptr) });
        log::debug!("Win32: released context of {:?}", from_hwnd(hwnd));
    }
    result
}

unsafe extern "system" fn collect_thread_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = unsafe { &mut *(lparam.0 as *mut Vec<NativeHandle>) };
    windows.push(from_hwnd(hwnd));
    BOOL::from(true)
}

/// Top-level windows owned by the calling thread.
pub fn thread_windows() -> Vec<NativeHandle> {
    let mut windows: Vec<NativeHandle> = Vec::new();
    unsafe {
        let _ = EnumThreadWindows(
            GetCurrentThreadId(),
            Some(collect_thread_window),
            LPARAM(&mut windows as *mut Vec<NativeHandle> as isize),
        );
    }
    windows
}

/*
 * Registers with `router` every host window on this thread that is not yet
 * registered, found through the identity protocol. Returns the number adopted.
 */
pub fn discover_thread_windows(router: &MessageRouter, channel: &dyn MessageChannel) -> usize {
    router.adopt(thread_windows(), channel, |handle, token| {
        // The window verified that this address and generation are its own
        // live context, which stays allocated until WM_NCDESTROY.
        let context = unsafe { &*(token.address as *const WindowContext) };
        let host = Rc::clone(&context.host);
        (host.handle() == handle).then_some(host)
    })
}
