/*
 * A top-level native window that hosts islands. `HostWindow` owns the window's
 * focus navigator and its identity slot, registers itself with the message
 * router once the native window exists and unregisters on destruction. The
 * window procedure (see `win32::window`) forwards every message to
 * `handle_message`; a `None` result means default processing.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::focus_navigator::FocusNavigator;
use crate::identity::{IdentitySlot, OwnerToken};
use crate::island::{Island, IslandSource};
use crate::messages::{WM_ACTIVATE, WM_DESTROY, WM_NCDESTROY, WM_SETFOCUS, loword};
use crate::platform::NativeWindowing;
use crate::router::MessageRouter;
use crate::types::{InputMessage, IslandOptions, NativeHandle};

use std::rc::{Rc, Weak};

pub struct HostWindow {
    navigator: Rc<FocusNavigator>,
    identity: IdentitySlot,
    windowing: Rc<dyn NativeWindowing>,
    router: Weak<MessageRouter>,
    is_main: bool,
}

impl HostWindow {
    /// `is_main` windows post quit when destroyed.
    pub fn new(
        router: &Rc<MessageRouter>,
        windowing: Rc<dyn NativeWindowing>,
        is_main: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            navigator: FocusNavigator::new(Rc::clone(&windowing)),
            identity: IdentitySlot::new(),
            windowing,
            router: Rc::downgrade(router),
            is_main,
        })
    }

    pub fn handle(&self) -> NativeHandle {
        self.navigator.window()
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn navigator(&self) -> &Rc<FocusNavigator> {
        &self.navigator
    }

    pub fn identity(&self) -> &IdentitySlot {
        &self.identity
    }

    /*
     * Called while the native window is being created (`WM_NCCREATE`), once its
     * handle is known and `owner_address` has been written to its user-data
     * slot. Failure here aborts window creation.
     */
    pub fn on_native_created(
        self: &Rc<Self>,
        handle: NativeHandle,
        owner_address: usize,
    ) -> PlatformResult<OwnerToken> {
        self.navigator.bind_window(handle)?;
        let token = self.identity.associate(owner_address)?;
        if let Some(router) = self.router.upgrade() {
            router.register(self);
        }
        log::debug!("HostWindow: {handle:?} created (generation {})", token.generation);
        Ok(token)
    }

    pub fn create_island<S>(
        &self,
        source: S,
        content: S::Content,
        options: IslandOptions,
    ) -> PlatformResult<NativeHandle>
    where
        S: IslandSource + 'static,
    {
        self.navigator.create_island(source, content, options)
    }

    pub fn islands(&self) -> Vec<Rc<dyn Island>> {
        self.navigator.islands()
    }

    pub fn navigate(&self, msg: &InputMessage) -> PlatformResult<bool> {
        self.navigator.navigate(msg)
    }

    pub fn handle_message(
        &self,
        msg: u32,
        wparam: usize,
        lparam: isize,
    ) -> PlatformResult<Option<isize>> {
        if let Some(reply) = self.identity.answer(msg, wparam, lparam) {
            return Ok(Some(reply));
        }

        match msg {
            WM_ACTIVATE => {
                self.navigator.on_activate(loword(wparam));
                Ok(Some(0))
            }
            WM_SETFOCUS => {
                self.navigator.on_set_focus()?;
                Ok(Some(0))
            }
            WM_DESTROY => {
                self.on_destroy()?;
                Ok(Some(0))
            }
            WM_NCDESTROY => {
                log::debug!("HostWindow: {:?} clearing identity", self.handle());
                self.identity.clear();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn on_destroy(&self) -> PlatformResult<()> {
        let handle = self.handle();
        log::debug!("HostWindow: {handle:?} destroying");
        if let Some(router) = self.router.upgrade() {
            router.unregister(handle);
        }
        let cleared = self.navigator.clear_islands();
        if self.is_main {
            self.windowing.post_quit(0);
        }
        cleared
    }

    /// Hands an error raised inside the window procedure to the pump, which
    /// cannot be returned through the native callback.
    pub fn defer_fatal(&self, err: PlatformError) {
        match self.router.upgrade() {
            Some(router) => router.defer_fatal(err),
            None => log::error!("HostWindow: fatal error with no router to report to: {err}"),
        }
    }
}

impl std::fmt::Debug for HostWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostWindow")
            .field("handle", &self.handle())
            .field("is_main", &self.is_main)
            .field("navigator", &self.navigator)
            .finish()
    }
}
