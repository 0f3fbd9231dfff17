/*
 * Keyboard focus coordination for one top-level window that mixes native
 * controls and embedded islands.
 *
 * Outbound: a key-down for Tab or an arrow is mapped to a navigation reason, the
 * next native tab stop is computed and, if that tab stop is an island, focus is
 * handed to the island with a correlated request. Anything else falls back to
 * native dialog navigation.
 *
 * Inbound: when an island asks to give focus away, the request's correlation id
 * tells us whether it is confirming a hand-off we started (restore focus inside
 * the island) or leaving on its own (continue through the native tab order).
 *
 * The navigator is driven from a single thread. Islands may raise their exit
 * event synchronously while we are inside one of their calls, so no `RefCell`
 * borrow is held across a call into an island or the windowing layer.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::island::{Island, IslandEvents, IslandHandle, IslandSource};
use crate::messages::{VK_SHIFT, WA_INACTIVE};
use crate::navigation::{
    CorrelationId, NavigationReason, NavigationRequest, key_from_reason, reason_from_key,
};
use crate::platform::NativeWindowing;
use crate::types::{HintRect, InputMessage, IslandOptions, KeyboardState, NativeHandle};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    Idle,
    AwaitingHandoff(CorrelationId),
}

/// Focus bookkeeping for one window.
#[derive(Debug, Default)]
pub struct FocusState {
    last_focused: Cell<Option<NativeHandle>>,
    last_request: Cell<Option<CorrelationId>>,
}

impl FocusState {
    /// Native control that had focus when the window was last deactivated.
    pub fn last_focused(&self) -> Option<NativeHandle> {
        self.last_focused.get()
    }

    /// Correlation id of the most recently issued navigation request.
    pub fn last_request(&self) -> Option<CorrelationId> {
        self.last_request.get()
    }
}

pub struct FocusNavigator {
    window: Cell<NativeHandle>,
    windowing: Rc<dyn NativeWindowing>,
    islands: RefCell<Vec<Rc<dyn Island>>>,
    state: Cell<NavigatorState>,
    focus: FocusState,
}

impl FocusNavigator {
    pub fn new(windowing: Rc<dyn NativeWindowing>) -> Rc<Self> {
        Rc::new(Self {
            window: Cell::new(NativeHandle::NULL),
            windowing,
            islands: RefCell::new(Vec::new()),
            state: Cell::new(NavigatorState::Idle),
            focus: FocusState::default(),
        })
    }

    /// Binds the navigator to its top-level window. Done once, when the native
    /// window is created.
    pub fn bind_window(&self, window: NativeHandle) -> PlatformResult<()> {
        let current = self.window.get();
        if window.is_null() || (!current.is_null() && current != window) {
            return Err(PlatformError::InvalidHandle(format!(
                "FocusNavigator already bound to {current:?}, cannot bind to {window:?}"
            )));
        }
        self.window.set(window);
        Ok(())
    }

    pub fn window(&self) -> NativeHandle {
        self.window.get()
    }

    pub fn state(&self) -> NavigatorState {
        self.state.get()
    }

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    /*
     * Creates an island inside this window and registers it for navigation.
     * Returns the island's native handle so the caller can position it.
     */
    pub fn create_island<S>(
        self: &Rc<Self>,
        source: S,
        content: S::Content,
        options: IslandOptions,
    ) -> PlatformResult<NativeHandle>
    where
        S: IslandSource + 'static,
    {
        let parent = self.window.get();
        if parent.is_null() {
            return Err(PlatformError::InvalidHandle(
                "cannot create an island before the window exists".to_string(),
            ));
        }
        let events: Weak<dyn IslandEvents> = Rc::downgrade(self) as Weak<dyn IslandEvents>;
        let island = IslandHandle::attach(
            source,
            parent,
            content,
            options,
            self.windowing.as_ref(),
            events,
        )?;
        let handle = island.native_handle();
        self.islands.borrow_mut().push(Rc::new(island));
        Ok(handle)
    }

    /// Snapshot of the live islands in creation order.
    pub fn islands(&self) -> Vec<Rc<dyn Island>> {
        self.islands
            .borrow()
            .iter()
            .filter(|island| island.is_live())
            .cloned()
            .collect()
    }

    pub fn island_for(&self, handle: NativeHandle) -> Option<Rc<dyn Island>> {
        self.islands
            .borrow()
            .iter()
            .find(|island| island.native_handle() == handle && island.is_live())
            .cloned()
    }

    pub fn focused_island(&self) -> Option<Rc<dyn Island>> {
        self.islands().into_iter().find(|island| island.has_focus())
    }

    /*
     * Unsubscribes and closes every island. Every island is attempted; the
     * first failure is reported after the rest have been closed.
     */
    pub fn clear_islands(&self) -> PlatformResult<()> {
        let islands: Vec<Rc<dyn Island>> = self.islands.borrow_mut().drain(..).collect();
        let mut first_error = None;
        for island in islands {
            if let Err(err) = island.close() {
                log::error!(
                    "FocusNavigator: closing island {:?} failed: {err}",
                    island.native_handle()
                );
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /*
     * Entry point from the message router. Returns true when the message was
     * consumed, either by moving focus into an island, by being swallowed while
     * an island owns focus, or by native dialog navigation.
     */
    pub fn navigate(&self, msg: &InputMessage) -> PlatformResult<bool> {
        let keyboard = self.windowing.keyboard_state()?;
        if let Some(moved) = self.hand_off_for_key(msg, &keyboard, self.windowing.focused())? {
            return Ok(moved);
        }

        if self.focused_island().is_some() && !keyboard.alt_down() {
            // Native dialog navigation would let menu accelerators and the
            // dialog manager act behind the island's back.
            if navigation_reason(msg, &keyboard).is_some() {
                log::debug!(
                    "FocusNavigator: swallowing navigation key {:#04x} while an island has focus",
                    msg.virtual_key()
                );
                return Ok(true);
            }
            return Ok(false);
        }

        Ok(self.windowing.dialog_navigate(self.window.get(), msg))
    }

    /*
     * Outbound half of navigation: if `msg` is a navigation key and the next tab
     * stop after `from` is one of our islands, hands focus to it. `None` means
     * there was nothing to hand off to.
     */
    fn hand_off_for_key(
        &self,
        msg: &InputMessage,
        keyboard: &KeyboardState,
        from: Option<NativeHandle>,
    ) -> PlatformResult<Option<bool>> {
        let Some(reason) = navigation_reason(msg, keyboard) else {
            return Ok(None);
        };
        let Some(target) = self.handoff_target(reason, from) else {
            return Ok(None);
        };
        self.hand_off(reason, &target, from).map(Some)
    }

    /// Next tab stop after `from` in the direction of `reason`, if it is one of
    /// our islands.
    fn handoff_target(
        &self,
        reason: NavigationReason,
        from: Option<NativeHandle>,
    ) -> Option<Rc<dyn Island>> {
        let direction = reason.direction()?;
        let next = self
            .windowing
            .next_tab_stop(self.window.get(), from, direction.is_backward())?;
        self.island_for(next)
    }

    fn hint_from(&self, previous: NativeHandle, island: NativeHandle) -> PlatformResult<HintRect> {
        let rect = self.windowing.window_rect(previous)?;
        let origin = self.windowing.screen_to_client(island, rect.origin())?;
        Ok(HintRect {
            x: origin.x as f32,
            y: origin.y as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        })
    }

    /*
     * Moves focus into `island`. The embedded runtime does not always move
     * native keyboard focus along with its own, so on success native focus is
     * forced onto the island's window.
     */
    fn hand_off(
        &self,
        reason: NavigationReason,
        island: &Rc<dyn Island>,
        previous: Option<NativeHandle>,
    ) -> PlatformResult<bool> {
        let island_handle = island.native_handle();
        let request = match previous {
            Some(previous) => {
                NavigationRequest::with_hint(reason, self.hint_from(previous, island_handle)?)
            }
            None => NavigationRequest::new(reason),
        };

        log::debug!(
            "FocusNavigator: handing focus to island {island_handle:?} ({reason:?}, request {})",
            request.correlation_id
        );
        self.focus.last_request.set(Some(request.correlation_id));
        self.state
            .set(NavigatorState::AwaitingHandoff(request.correlation_id));
        let outcome = island.navigate_focus(&request);
        self.state.set(NavigatorState::Idle);

        let result = outcome.map_err(|err| {
            log::error!("FocusNavigator: navigation into island {island_handle:?} failed: {err}");
            PlatformError::FocusTransferFailed(format!("navigate into {island_handle:?}: {err}"))
        })?;

        if result.was_moved {
            self.force_focus(island_handle)?;
        }
        Ok(result.was_moved)
    }

    fn force_focus(&self, handle: NativeHandle) -> PlatformResult<()> {
        self.windowing.set_focus(handle).map_err(|err| {
            log::error!("FocusNavigator: SetFocus({handle:?}) failed: {err}");
            PlatformError::FocusTransferFailed(format!("set focus to {handle:?}: {err}"))
        })
    }

    fn continue_past_island(
        &self,
        source: NativeHandle,
        request: &NavigationRequest,
    ) -> PlatformResult<()> {
        let backward = request
            .reason
            .direction()
            .is_none_or(|direction| direction.is_backward());

        // Replay the exit as the key press that would have caused it, sent
        // from the island, so it takes the same outbound path as real input.
        if let Some(key) = key_from_reason(request.reason) {
            let keyboard = if backward {
                KeyboardState::default().with_key_down(VK_SHIFT)
            } else {
                KeyboardState::default()
            };
            let replay = InputMessage::key_down(source, key);
            if self.hand_off_for_key(&replay, &keyboard, Some(source))? == Some(true) {
                return Ok(());
            }
        }

        match self
            .windowing
            .next_tab_stop(self.window.get(), Some(source), backward)
        {
            Some(next) => {
                log::debug!("FocusNavigator: focus leaves island {source:?} for {next:?}");
                self.force_focus(next)
            }
            None => {
                log::debug!("FocusNavigator: no tab stop after island {source:?}");
                Ok(())
            }
        }
    }

    fn confirm_handoff(&self, island: &Rc<dyn Island>) -> PlatformResult<()> {
        let handle = island.native_handle();
        let restore = NavigationRequest::new(NavigationReason::Restore);
        self.focus.last_request.set(Some(restore.correlation_id));
        island.navigate_focus(&restore).map_err(|err| {
            PlatformError::FocusTransferFailed(format!("restore focus in {handle:?}: {err}"))
        })?;
        self.force_focus(handle)
    }

    /// `WM_ACTIVATE`: remember which control had focus when we lose activation.
    pub fn on_activate(&self, state: u32) {
        if state == WA_INACTIVE {
            let focused = self.windowing.focused();
            log::debug!("FocusNavigator: deactivated with focus on {focused:?}");
            self.focus.last_focused.set(focused);
        }
    }

    /// `WM_SETFOCUS`: hand focus back to the control remembered at deactivation.
    pub fn on_set_focus(&self) -> PlatformResult<()> {
        match self.focus.last_focused.get() {
            Some(handle) => self.force_focus(handle),
            None => Ok(()),
        }
    }
}

fn navigation_reason(msg: &InputMessage, keyboard: &KeyboardState) -> Option<NavigationReason> {
    msg.is_key_down()
        .then(|| reason_from_key(msg.virtual_key(), keyboard))
        .flatten()
}

impl IslandEvents for FocusNavigator {
    fn on_focus_exit_requested(
        &self,
        source: NativeHandle,
        request: &NavigationRequest,
    ) -> PlatformResult<()> {
        let Some(island) = self.island_for(source) else {
            log::warn!("FocusNavigator: exit request from unknown island {source:?}");
            return Ok(());
        };

        if self.focus.last_request.get() == Some(request.correlation_id) {
            log::debug!(
                "FocusNavigator: island {source:?} confirmed request {}",
                request.correlation_id
            );
            self.confirm_handoff(&island)
        } else {
            log::debug!(
                "FocusNavigator: island {source:?} is leaving on its own ({:?})",
                request.reason
            );
            self.continue_past_island(source, request)
        }
    }

    fn on_got_focus(&self, source: NativeHandle) -> PlatformResult<()> {
        // Not reliably raised by the runtime; informational only.
        log::debug!("FocusNavigator: got-focus from island {source:?}");
        if self.windowing.focused() != Some(source) {
            log::warn!("FocusNavigator: island {source:?} got focus but its window does not");
        }
        Ok(())
    }
}

impl std::fmt::Debug for FocusNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusNavigator")
            .field("window", &self.window.get())
            .field("islands", &self.islands.borrow().len())
            .field("state", &self.state.get())
            .field("focus", &self.focus)
            .finish()
    }
}
