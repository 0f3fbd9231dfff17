/*
 * Scripted stand-ins for the native window system, the embedded runtime and the
 * message queue. They record what they are asked to do into a shared `CallLog`
 * so tests can assert on ordering across collaborators.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::identity::IdentitySlot;
use crate::island::{EventToken, GotFocusHandler, IslandEvents, IslandSource, TakeFocusHandler};
use crate::navigation::{NavigationRequest, NavigationResult};
use crate::platform::{
    EmbeddedRuntime, FatalNotifier, MessageChannel, MessageQueue, NativeWindowing, Retrieved,
};
use crate::types::{InputMessage, KeyboardState, NativeHandle, Point, Rect};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/*
 * Native windowing fake. The tab order is a flat list that wraps around, the
 * way `GetNextDlgTabItem` does; a window's client origin is its window-rect
 * origin.
 */
pub(crate) struct FakeWindowing {
    root: NativeHandle,
    log: CallLog,
    focused: Cell<Option<NativeHandle>>,
    tab_order: RefCell<Vec<NativeHandle>>,
    rects: RefCell<HashMap<NativeHandle, Rect>>,
    keyboard: Cell<KeyboardState>,
    dialog_result: Cell<bool>,
    dialog_calls: Cell<usize>,
    fail_set_focus: Cell<bool>,
    styles: RefCell<Vec<(NativeHandle, u32)>>,
    quit: Cell<Option<i32>>,
}

impl FakeWindowing {
    pub(crate) fn new(root: NativeHandle) -> Self {
        Self::with_log(root, CallLog::default())
    }

    pub(crate) fn with_log(root: NativeHandle, log: CallLog) -> Self {
        Self {
            root,
            log,
            focused: Cell::new(None),
            tab_order: RefCell::new(Vec::new()),
            rects: RefCell::new(HashMap::new()),
            keyboard: Cell::new(KeyboardState::default()),
            dialog_result: Cell::new(false),
            dialog_calls: Cell::new(0),
            fail_set_focus: Cell::new(false),
            styles: RefCell::new(Vec::new()),
            quit: Cell::new(None),
        }
    }

    pub(crate) fn set_tab_order(&self, order: &[NativeHandle]) {
        *self.tab_order.borrow_mut() = order.to_vec();
    }

    pub(crate) fn set_rect(&self, handle: NativeHandle, rect: Rect) {
        self.rects.borrow_mut().insert(handle, rect);
    }

    pub(crate) fn set_focused(&self, handle: Option<NativeHandle>) {
        self.focused.set(handle);
    }

    pub(crate) fn set_keyboard(&self, keyboard: KeyboardState) {
        self.keyboard.set(keyboard);
    }

    pub(crate) fn set_dialog_result(&self, handled: bool) {
        self.dialog_result.set(handled);
    }

    pub(crate) fn dialog_calls(&self) -> usize {
        self.dialog_calls.get()
    }

    pub(crate) fn fail_set_focus(&self, fail: bool) {
        self.fail_set_focus.set(fail);
    }

    pub(crate) fn styles_added(&self) -> Vec<(NativeHandle, u32)> {
        self.styles.borrow().clone()
    }

    pub(crate) fn quit_posted(&self) -> Option<i32> {
        self.quit.get()
    }

    pub(crate) fn current_focus(&self) -> Option<NativeHandle> {
        self.focused.get()
    }
}

impl NativeWindowing for FakeWindowing {
    fn focused(&self) -> Option<NativeHandle> {
        self.focused.get()
    }

    fn set_focus(&self, handle: NativeHandle) -> PlatformResult<()> {
        self.log.push(format!("set_focus({})", handle.0));
        if self.fail_set_focus.get() {
            return Err(PlatformError::OperationFailed("SetFocus".to_string()));
        }
        self.focused.set(Some(handle));
        Ok(())
    }

    fn next_tab_stop(
        &self,
        root: NativeHandle,
        from: Option<NativeHandle>,
        backward: bool,
    ) -> Option<NativeHandle> {
        assert_eq!(root, self.root, "tab order queried on the wrong root");
        let order = self.tab_order.borrow();
        if order.is_empty() {
            return None;
        }
        let len = order.len();
        let index = match from.and_then(|from| order.iter().position(|h| *h == from)) {
            Some(i) if backward => (i + len - 1) % len,
            Some(i) => (i + 1) % len,
            None if backward => len - 1,
            None => 0,
        };
        Some(order[index])
    }

    fn window_rect(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        self.rects
            .borrow()
            .get(&handle)
            .copied()
            .ok_or_else(|| PlatformError::InvalidHandle(format!("no rect for {handle:?}")))
    }

    fn screen_to_client(&self, handle: NativeHandle, point: Point) -> PlatformResult<Point> {
        let origin = self.window_rect(handle)?.origin();
        Ok(Point {
            x: point.x - origin.x,
            y: point.y - origin.y,
        })
    }

    fn keyboard_state(&self) -> PlatformResult<KeyboardState> {
        Ok(self.keyboard.get())
    }

    fn dialog_navigate(&self, root: NativeHandle, msg: &InputMessage) -> bool {
        self.log
            .push(format!("dialog_navigate({}, {:#x})", root.0, msg.message));
        self.dialog_calls.set(self.dialog_calls.get() + 1);
        self.dialog_result.get()
    }

    fn add_window_style(&self, handle: NativeHandle, style: u32) -> PlatformResult<()> {
        self.styles.borrow_mut().push((handle, style));
        Ok(())
    }

    fn post_quit(&self, exit_code: i32) {
        self.log.push(format!("post_quit({exit_code})"));
        self.quit.set(Some(exit_code));
    }
}

type NavigateHook = Box<dyn Fn(&FakeSource, &NavigationRequest) -> PlatformResult<()>>;

struct FakeSourceState {
    handle: NativeHandle,
    log: CallLog,
    consumes: Cell<bool>,
    has_focus: Cell<bool>,
    moves_focus: Cell<bool>,
    fail_navigate: Cell<bool>,
    offered: Cell<usize>,
    requests: RefCell<Vec<NavigationRequest>>,
    next_token: Cell<u64>,
    take_focus_handlers: RefCell<Vec<(EventToken, TakeFocusHandler)>>,
    got_focus_handlers: RefCell<Vec<(EventToken, GotFocusHandler)>>,
    revoke_hook: RefCell<Option<Box<dyn Fn()>>>,
    navigate_hook: RefCell<Option<NavigateHook>>,
}

/// Embedded-runtime island fake. Clones share state, so a test can keep one
/// while the handle under test owns another.
#[derive(Clone)]
pub(crate) struct FakeSource(Rc<FakeSourceState>);

impl FakeSource {
    pub(crate) fn new(handle: NativeHandle, log: CallLog) -> Self {
        Self(Rc::new(FakeSourceState {
            handle,
            log,
            consumes: Cell::new(false),
            has_focus: Cell::new(false),
            moves_focus: Cell::new(true),
            fail_navigate: Cell::new(false),
            offered: Cell::new(0),
            requests: RefCell::new(Vec::new()),
            next_token: Cell::new(1),
            take_focus_handlers: RefCell::new(Vec::new()),
            got_focus_handlers: RefCell::new(Vec::new()),
            revoke_hook: RefCell::new(None),
            navigate_hook: RefCell::new(None),
        }))
    }

    fn tag(&self, call: &str) {
        self.0.log.push(format!("{}:{call}", self.0.handle.0));
    }

    fn token(&self) -> EventToken {
        let token = self.0.next_token.get();
        self.0.next_token.set(token + 1);
        EventToken(token)
    }

    pub(crate) fn set_consumes(&self, consumes: bool) {
        self.0.consumes.set(consumes);
    }

    pub(crate) fn set_has_focus(&self, focused: bool) {
        self.0.has_focus.set(focused);
    }

    pub(crate) fn set_moves_focus(&self, moves: bool) {
        self.0.moves_focus.set(moves);
    }

    pub(crate) fn fail_navigate(&self, fail: bool) {
        self.0.fail_navigate.set(fail);
    }

    pub(crate) fn offered(&self) -> usize {
        self.0.offered.get()
    }

    pub(crate) fn requests(&self) -> Vec<NavigationRequest> {
        self.0.requests.borrow().clone()
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        !self.0.take_focus_handlers.borrow().is_empty()
            || !self.0.got_focus_handlers.borrow().is_empty()
    }

    pub(crate) fn on_revoke(&self, hook: impl Fn() + 'static) {
        *self.0.revoke_hook.borrow_mut() = Some(Box::new(hook));
    }

    /// Runs `hook` from inside `navigate_focus`, the way the runtime raises
    /// events synchronously.
    pub(crate) fn on_navigate(
        &self,
        hook: impl Fn(&FakeSource, &NavigationRequest) -> PlatformResult<()> + 'static,
    ) {
        *self.0.navigate_hook.borrow_mut() = Some(Box::new(hook));
    }

    pub(crate) fn raise_take_focus_requested(
        &self,
        request: &NavigationRequest,
    ) -> PlatformResult<()> {
        for (_, handler) in self.0.take_focus_handlers.borrow().iter() {
            handler(request)?;
        }
        Ok(())
    }

    pub(crate) fn raise_got_focus(&self) -> PlatformResult<()> {
        for (_, handler) in self.0.got_focus_handlers.borrow().iter() {
            handler()?;
        }
        Ok(())
    }

    fn run_revoke_hook(&self) {
        if let Some(hook) = self.0.revoke_hook.borrow().as_ref() {
            hook();
        }
    }
}

impl IslandSource for FakeSource {
    type Content = String;

    fn attach_to_window(&self, parent: NativeHandle) -> PlatformResult<()> {
        self.tag(&format!("attach({})", parent.0));
        Ok(())
    }

    fn window_handle(&self) -> PlatformResult<NativeHandle> {
        self.tag("window_handle");
        Ok(self.0.handle)
    }

    fn set_content(&self, content: String) -> PlatformResult<()> {
        self.tag(&format!("set_content({content})"));
        Ok(())
    }

    fn pre_translate_message(&self, _msg: &InputMessage) -> PlatformResult<bool> {
        self.tag("pre_translate");
        self.0.offered.set(self.0.offered.get() + 1);
        Ok(self.0.consumes.get())
    }

    fn navigate_focus(&self, request: &NavigationRequest) -> PlatformResult<NavigationResult> {
        self.tag(&format!("navigate({:?})", request.reason));
        self.0.requests.borrow_mut().push(*request);
        if self.0.fail_navigate.get() {
            return Err(PlatformError::OperationFailed("NavigateFocus".to_string()));
        }
        let hook = self.0.navigate_hook.borrow_mut().take();
        if let Some(hook) = hook {
            let outcome = hook(self, request);
            *self.0.navigate_hook.borrow_mut() = Some(hook);
            outcome?;
        }
        Ok(NavigationResult {
            was_moved: self.0.moves_focus.get(),
        })
    }

    fn has_focus(&self) -> bool {
        self.0.has_focus.get()
    }

    fn subscribe_take_focus_requested(
        &self,
        handler: TakeFocusHandler,
    ) -> PlatformResult<EventToken> {
        self.tag("subscribe_take_focus");
        let token = self.token();
        self.0.take_focus_handlers.borrow_mut().push((token, handler));
        Ok(token)
    }

    fn revoke_take_focus_requested(&self, token: EventToken) -> PlatformResult<()> {
        self.tag("revoke_take_focus");
        self.run_revoke_hook();
        self.0
            .take_focus_handlers
            .borrow_mut()
            .retain(|(t, _)| *t != token);
        Ok(())
    }

    fn subscribe_got_focus(&self, handler: GotFocusHandler) -> PlatformResult<EventToken> {
        self.tag("subscribe_got_focus");
        let token = self.token();
        self.0.got_focus_handlers.borrow_mut().push((token, handler));
        Ok(token)
    }

    fn revoke_got_focus(&self, token: EventToken) -> PlatformResult<()> {
        self.tag("revoke_got_focus");
        self.0
            .got_focus_handlers
            .borrow_mut()
            .retain(|(t, _)| *t != token);
        Ok(())
    }

    fn close(&self) -> PlatformResult<()> {
        self.tag("close");
        Ok(())
    }
}

/// Records island events delivered through `IslandEvents`.
#[derive(Default)]
pub(crate) struct RecordingEvents {
    exits: RefCell<Vec<(NativeHandle, NavigationRequest)>>,
    got_focus: RefCell<Vec<NativeHandle>>,
}

impl RecordingEvents {
    pub(crate) fn exits(&self) -> Vec<(NativeHandle, NavigationRequest)> {
        self.exits.borrow().clone()
    }

    pub(crate) fn got_focus(&self) -> Vec<NativeHandle> {
        self.got_focus.borrow().clone()
    }
}

impl IslandEvents for RecordingEvents {
    fn on_focus_exit_requested(
        &self,
        source: NativeHandle,
        request: &NavigationRequest,
    ) -> PlatformResult<()> {
        self.exits.borrow_mut().push((source, *request));
        Ok(())
    }

    fn on_got_focus(&self, source: NativeHandle) -> PlatformResult<()> {
        self.got_focus.borrow_mut().push(source);
        Ok(())
    }
}

/// Queue fake fed with a fixed script of retrievals.
pub(crate) struct FakeQueue {
    log: CallLog,
    script: RefCell<VecDeque<Retrieved>>,
    leftovers: Cell<usize>,
    dispatched: RefCell<Vec<InputMessage>>,
}

impl FakeQueue {
    pub(crate) fn new(log: CallLog, script: Vec<Retrieved>) -> Self {
        Self {
            log,
            script: RefCell::new(script.into()),
            leftovers: Cell::new(0),
            dispatched: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_leftovers(self, count: usize) -> Self {
        self.leftovers.set(count);
        self
    }

    pub(crate) fn dispatched(&self) -> Vec<InputMessage> {
        self.dispatched.borrow().clone()
    }
}

impl MessageQueue for FakeQueue {
    fn next_message(&self) -> PlatformResult<Retrieved> {
        self.script
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PlatformError::OperationFailed("queue script exhausted".to_string()))
    }

    fn translate_and_dispatch(&self, msg: &InputMessage) {
        self.log.push(format!("dispatch({:#x})", msg.message));
        self.dispatched.borrow_mut().push(*msg);
    }

    fn drain(&self) -> usize {
        let count = self.leftovers.replace(0);
        self.log.push(format!("drain({count})"));
        count
    }
}

/// Delivers private messages straight to registered identity slots; unknown
/// windows answer like `DefWindowProc` does for an unhandled user message.
#[derive(Default)]
pub(crate) struct FakeChannel {
    slots: RefCell<HashMap<NativeHandle, Rc<IdentitySlot>>>,
}

impl FakeChannel {
    pub(crate) fn register(&self, handle: NativeHandle, slot: Rc<IdentitySlot>) {
        self.slots.borrow_mut().insert(handle, slot);
    }
}

impl MessageChannel for FakeChannel {
    fn send_message(&self, target: NativeHandle, msg: u32, wparam: usize, lparam: isize) -> isize {
        let slot = self.slots.borrow().get(&target).cloned();
        slot.and_then(|slot| slot.answer(msg, wparam, lparam))
            .unwrap_or(0)
    }
}

pub(crate) struct FakeRuntime {
    log: CallLog,
}

impl FakeRuntime {
    pub(crate) fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl EmbeddedRuntime for FakeRuntime {
    fn shutdown(&self) -> PlatformResult<()> {
        self.log.push("runtime_shutdown");
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeNotifier {
    messages: RefCell<Vec<String>>,
}

impl FakeNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl FatalNotifier for FakeNotifier {
    fn notify_fatal(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
