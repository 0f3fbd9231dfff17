/*
 * Process-wide message routing. Every message retrieved from the queue is
 * offered, in order, to:
 *   1. each island of each participating window (first consumer wins),
 *   2. each window's focus navigator (first one that handles it wins),
 *   3. default translate + dispatch.
 *
 * Windows register themselves when their native window is created and
 * unregister on destruction, so the set is always the live one. The router
 * holds only weak references; each window is owned by its native context. The set is
 * snapshotted per message: a window may be created or destroyed while a
 * message is being handled without disturbing the iteration.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host_window::HostWindow;
use crate::identity::{OwnerToken, lookup};
use crate::platform::{MessageChannel, MessageQueue, Retrieved};
use crate::types::{InputMessage, NativeHandle};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// An island's pre-translation hook consumed the message.
    ConsumedByIsland(NativeHandle),
    /// A window's navigator handled it.
    Navigated(NativeHandle),
    Unhandled,
}

#[derive(Default)]
pub struct MessageRouter {
    /// Non-owning: a window's native context owns it.
    participants: RefCell<Vec<Weak<HostWindow>>>,
    deferred_fatal: RefCell<Option<PlatformError>>,
}

impl MessageRouter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn register(&self, window: &Rc<HostWindow>) {
        let mut participants = self.participants.borrow_mut();
        participants.retain(|w| w.strong_count() > 0);
        if participants
            .iter()
            .any(|w| std::ptr::eq(w.as_ptr(), Rc::as_ptr(window)))
        {
            return;
        }
        log::debug!("MessageRouter: registered window {:?}", window.handle());
        participants.push(Rc::downgrade(window));
    }

    pub fn unregister(&self, handle: NativeHandle) -> bool {
        let mut participants = self.participants.borrow_mut();
        let before = participants.len();
        participants.retain(|w| w.upgrade().is_some_and(|w| w.handle() != handle));
        let removed = participants.len() != before;
        if removed {
            log::debug!("MessageRouter: unregistered window {handle:?}");
        }
        removed
    }

    pub fn is_registered(&self, handle: NativeHandle) -> bool {
        self.participants().iter().any(|w| w.handle() == handle)
    }

    /// Snapshot of the participants that are still alive.
    pub fn participants(&self) -> Vec<Rc<HostWindow>> {
        self.participants
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /*
     * Registers participating windows that were created without going through
     * this router, found by asking each candidate handle over the identity
     * protocol. `resolve_owner` turns a verified token into the window object.
     * Returns the number of windows adopted.
     */
    pub fn adopt<I, F>(&self, candidates: I, channel: &dyn MessageChannel, resolve_owner: F) -> usize
    where
        I: IntoIterator<Item = NativeHandle>,
        F: Fn(NativeHandle, OwnerToken) -> Option<Rc<HostWindow>>,
    {
        let mut adopted = 0;
        for handle in candidates {
            if self.is_registered(handle) {
                continue;
            }
            let Some(token) = lookup(channel, handle) else {
                continue;
            };
            if let Some(window) = resolve_owner(handle, token) {
                self.register(&window);
                adopted += 1;
            }
        }
        adopted
    }

    /// Runs one message through the routing chain.
    pub fn route(&self, msg: &InputMessage) -> PlatformResult<RouteOutcome> {
        let windows = self.participants();

        for window in &windows {
            for island in window.islands() {
                if island.offer_message(msg)? {
                    return Ok(RouteOutcome::ConsumedByIsland(island.native_handle()));
                }
            }
        }

        for window in &windows {
            if window.navigate(msg)? {
                return Ok(RouteOutcome::Navigated(window.handle()));
            }
        }

        Ok(RouteOutcome::Unhandled)
    }

    pub fn defer_fatal(&self, err: PlatformError) {
        log::error!("MessageRouter: fatal error raised during dispatch: {err}");
        let mut slot = self.deferred_fatal.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub fn take_fatal(&self) -> Option<PlatformError> {
        self.deferred_fatal.borrow_mut().take()
    }

    /*
     * The message pump. Blocks in `next_message` until a message arrives and
     * returns the quit payload once the quit signal is retrieved. Any routing
     * error, or one deferred from a window procedure, stops the pump.
     */
    pub fn run(&self, queue: &dyn MessageQueue) -> PlatformResult<i32> {
        log::debug!("MessageRouter: entering message loop");
        loop {
            let msg = match queue.next_message()? {
                Retrieved::Quit(exit_code) => {
                    log::debug!("MessageRouter: quit received with code {exit_code}");
                    return Ok(exit_code);
                }
                Retrieved::Message(msg) => msg,
            };

            if self.route(&msg)? == RouteOutcome::Unhandled {
                queue.translate_and_dispatch(&msg);
            }

            if let Some(err) = self.take_fatal() {
                return Err(err);
            }
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("participants", &self.participants().len())
            .finish()
    }
}
