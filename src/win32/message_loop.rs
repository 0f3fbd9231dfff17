/*
 * The thread message queue behind `MessageQueue`: blocking retrieval with
 * `GetMessageW`, default translate + dispatch, and the non-blocking drain run
 * after the loop has quit.
 */
use super::{from_msg, to_msg};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::platform::{MessageQueue, Retrieved};
use crate::types::InputMessage;

use windows::Win32::Foundation::GetLastError;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Win32MessageQueue;

impl MessageQueue for Win32MessageQueue {
    fn next_message(&self) -> PlatformResult<Retrieved> {
        let mut msg = MSG::default();
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match result.0 {
            -1 => {
                let error = unsafe { GetLastError() };
                log::error!("Win32MessageQueue: GetMessageW failed: {error:?}");
                Err(PlatformError::OperationFailed(format!(
                    "GetMessageW failed: {error:?}"
                )))
            }
            0 => Ok(Retrieved::Quit(msg.wParam.0 as i32)),
            _ => Ok(Retrieved::Message(from_msg(&msg))),
        }
    }

    fn translate_and_dispatch(&self, msg: &InputMessage) {
        let native = to_msg(msg);
        unsafe {
            let _ = TranslateMessage(&native);
            DispatchMessageW(&native);
        }
    }

    fn drain(&self) -> usize {
        let mut msg = MSG::default();
        let mut drained = 0;
        while unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE) }.as_bool() {
            unsafe { DispatchMessageW(&msg) };
            drained += 1;
        }
        drained
    }
}
