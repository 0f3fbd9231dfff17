/*
 * Embedded-content handles. An `IslandSource` is the embedded runtime's object
 * for one hosted subtree (a desktop XAML source or similar); `IslandHandle` owns
 * one, attaches it to a native parent, wires its focus events back to whoever
 * coordinates focus for that window, and enforces the teardown order: events
 * are revoked before the source is closed, and nothing is forwarded to a source
 * once closing has begun.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::navigation::{NavigationRequest, NavigationResult};
use crate::platform::NativeWindowing;
use crate::types::{InputMessage, IslandOptions, NativeHandle};

use std::cell::Cell;
use std::rc::Weak;

/// Registration token returned by an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventToken(pub u64);

pub type TakeFocusHandler = Box<dyn Fn(&NavigationRequest) -> PlatformResult<()>>;
pub type GotFocusHandler = Box<dyn Fn() -> PlatformResult<()>>;

/// One island as exposed by the embedded UI runtime.
///
/// Handlers registered through the subscription methods may be invoked
/// synchronously from inside `pre_translate_message` or `navigate_focus`;
/// implementations propagate the handler's error out of that call.
pub trait IslandSource {
    /// Root element type the runtime accepts as island content.
    type Content;

    fn attach_to_window(&self, parent: NativeHandle) -> PlatformResult<()>;
    /// Null until the source has been attached.
    fn window_handle(&self) -> PlatformResult<NativeHandle>;
    fn set_content(&self, content: Self::Content) -> PlatformResult<()>;
    fn pre_translate_message(&self, msg: &InputMessage) -> PlatformResult<bool>;
    fn navigate_focus(&self, request: &NavigationRequest) -> PlatformResult<NavigationResult>;
    fn has_focus(&self) -> bool;
    fn subscribe_take_focus_requested(&self, handler: TakeFocusHandler)
    -> PlatformResult<EventToken>;
    fn revoke_take_focus_requested(&self, token: EventToken) -> PlatformResult<()>;
    fn subscribe_got_focus(&self, handler: GotFocusHandler) -> PlatformResult<EventToken>;
    fn revoke_got_focus(&self, token: EventToken) -> PlatformResult<()>;
    fn close(&self) -> PlatformResult<()>;
}

/// Receiver for the focus events of every island in a window.
pub trait IslandEvents {
    /// The island wants to give focus away, either spontaneously or as the
    /// answer to a navigation request it was sent.
    fn on_focus_exit_requested(
        &self,
        source: NativeHandle,
        request: &NavigationRequest,
    ) -> PlatformResult<()>;

    fn on_got_focus(&self, source: NativeHandle) -> PlatformResult<()>;
}

/// Type-erased view of an attached island, as seen by the navigator and the
/// router.
pub trait Island {
    fn native_handle(&self) -> NativeHandle;
    /// Offers a raw message to the island's pre-translation hook. Returns
    /// whether the island consumed it.
    fn offer_message(&self, msg: &InputMessage) -> PlatformResult<bool>;
    fn navigate_focus(&self, request: &NavigationRequest) -> PlatformResult<NavigationResult>;
    fn has_focus(&self) -> bool;
    fn is_live(&self) -> bool;
    /// Revokes both event subscriptions, then closes the source. Calling it
    /// a second time is an error.
    fn close(&self) -> PlatformResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Live,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct Subscriptions {
    take_focus: EventToken,
    got_focus: EventToken,
}

pub struct IslandHandle<S: IslandSource> {
    source: S,
    handle: NativeHandle,
    subscriptions: Cell<Option<Subscriptions>>,
    lifecycle: Cell<Lifecycle>,
}

impl<S: IslandSource> IslandHandle<S> {
    /*
     * Attaches `source` under `parent`, installs `content` as its root and
     * subscribes its focus events to `events`.
     * The source must be attached before its handle is queried; asking first
     * yields a null handle.
     */
    pub fn attach(
        source: S,
        parent: NativeHandle,
        content: S::Content,
        options: IslandOptions,
        windowing: &dyn NativeWindowing,
        events: Weak<dyn IslandEvents>,
    ) -> PlatformResult<Self> {
        source.attach_to_window(parent)?;
        let handle = source.window_handle()?;
        if handle.is_null() {
            log::error!("IslandHandle: island attached to {parent:?} reported a null handle");
            return Err(PlatformError::InvalidHandle(format!(
                "island attached to {parent:?} has no native handle"
            )));
        }

        if options.extra_styles != 0 {
            windowing.add_window_style(handle, options.extra_styles)?;
        }

        source.set_content(content)?;

        let exit_events = events.clone();
        let take_focus = source.subscribe_take_focus_requested(Box::new(
            move |request: &NavigationRequest| match exit_events.upgrade() {
                Some(receiver) => receiver.on_focus_exit_requested(handle, request),
                None => Ok(()),
            },
        ))?;
        let got_focus = source.subscribe_got_focus(Box::new(move || match events.upgrade() {
            Some(receiver) => receiver.on_got_focus(handle),
            None => Ok(()),
        }))?;

        log::debug!("IslandHandle: attached island {handle:?} to parent {parent:?}");

        Ok(Self {
            source,
            handle,
            subscriptions: Cell::new(Some(Subscriptions {
                take_focus,
                got_focus,
            })),
            lifecycle: Cell::new(Lifecycle::Live),
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: IslandSource> Island for IslandHandle<S> {
    fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    fn offer_message(&self, msg: &InputMessage) -> PlatformResult<bool> {
        if self.lifecycle.get() != Lifecycle::Live {
            log::warn!(
                "IslandHandle: message {:#06x} offered to island {:?} after close began; ignoring",
                msg.message,
                self.handle
            );
            return Ok(false);
        }
        self.source.pre_translate_message(msg)
    }

    fn navigate_focus(&self, request: &NavigationRequest) -> PlatformResult<NavigationResult> {
        if self.lifecycle.get() != Lifecycle::Live {
            return Err(PlatformError::IslandClosed(format!("{:?}", self.handle)));
        }
        self.source.navigate_focus(request)
    }

    fn has_focus(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Live && self.source.has_focus()
    }

    fn is_live(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Live
    }

    fn close(&self) -> PlatformResult<()> {
        if self.lifecycle.get() != Lifecycle::Live {
            return Err(PlatformError::IslandClosed(format!(
                "{:?} closed twice",
                self.handle
            )));
        }
        self.lifecycle.set(Lifecycle::Closing);

        if let Some(subscriptions) = self.subscriptions.take() {
            self.source
                .revoke_take_focus_requested(subscriptions.take_focus)?;
            self.source.revoke_got_focus(subscriptions.got_focus)?;
        }
        self.source.close()?;

        self.lifecycle.set(Lifecycle::Closed);
        log::debug!("IslandHandle: closed island {:?}", self.handle);
        Ok(())
    }
}

impl<S: IslandSource> std::fmt::Debug for IslandHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IslandHandle")
            .field("handle", &self.handle)
            .field("lifecycle", &self.lifecycle.get())
            .finish()
    }
}
