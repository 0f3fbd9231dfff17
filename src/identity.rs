/*
 * Window identity protocol. Any code in the process that only has a native
 * handle can ask the window, through private messages, whether it is one of
 * ours and, if so, for a token that leads back to the owning object. The
 * association lives in the window itself (its user-data slot), not in a global
 * table.
 *
 * A token carries the owner's address and a generation number. Before a token
 * is trusted it is verified against the window it came from, so a handle value
 * recycled by the OS, or a window already past `WM_NCDESTROY`, never resolves.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::messages::WM_USER;
use crate::platform::MessageChannel;
use crate::types::NativeHandle;

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reply is `HOST_IDENTIFIED` if the window belongs to this system.
pub const WM_QUERY_ISLAND_HOST: u32 = WM_USER + 10;
/// Reply is the owner address. Only meaningful after the query succeeded.
pub const WM_GET_ISLAND_HOST_POINTER: u32 = WM_USER + 11;
/// `lparam` is a candidate address; `wparam` is ignored. Reply is
/// `POINTER_MATCH` or `POINTER_NO_MATCH`.
pub const WM_VERIFY_ISLAND_HOST_POINTER: u32 = WM_USER + 12;
/// Reply is the owner's generation.
pub const WM_GET_ISLAND_HOST_GENERATION: u32 = WM_USER + 13;
/// Like `WM_VERIFY_ISLAND_HOST_POINTER`, but `wparam` must also carry the
/// owner's generation.
pub const WM_VERIFY_ISLAND_HOST_TOKEN: u32 = WM_USER + 14;

// Chosen to stay clear of the 0/1 answers a default window procedure gives.
pub const HOST_IDENTIFIED: isize = 0xFEED_F00D_u32 as isize;
pub const POINTER_MATCH: isize = 0x0000_900D;
pub const POINTER_NO_MATCH: isize = 0x0000_BAAD;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Non-owning reference to a participating window's owner object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken {
    pub address: usize,
    pub generation: u64,
}

/// The window-side half of the protocol: holds the association and answers
/// the private messages.
#[derive(Debug, Default)]
pub struct IdentitySlot {
    token: Cell<Option<OwnerToken>>,
}

impl IdentitySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates the slot with its owner. Happens exactly once, while the
    /// native window is being created.
    pub fn associate(&self, address: usize) -> PlatformResult<OwnerToken> {
        if address == 0 {
            return Err(PlatformError::IdentityAssociationFailed(
                "owner address is null".to_string(),
            ));
        }
        if let Some(existing) = self.token.get() {
            return Err(PlatformError::IdentityAssociationFailed(format!(
                "slot already associated with {:#x}",
                existing.address
            )));
        }
        let token = OwnerToken {
            address,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        };
        self.token.set(Some(token));
        Ok(token)
    }

    /// Drops the association; afterwards the window no longer identifies as
    /// ours.
    pub fn clear(&self) {
        self.token.set(None);
    }

    pub fn token(&self) -> Option<OwnerToken> {
        self.token.get()
    }

    /// Answers one of the private messages, or returns `None` so the caller
    /// falls back to default processing.
    pub fn answer(&self, msg: u32, wparam: usize, lparam: isize) -> Option<isize> {
        let token = self.token.get()?;
        match msg {
            WM_QUERY_ISLAND_HOST => Some(HOST_IDENTIFIED),
            WM_GET_ISLAND_HOST_POINTER => Some(token.address as isize),
            WM_GET_ISLAND_HOST_GENERATION => Some(token.generation as isize),
            WM_VERIFY_ISLAND_HOST_POINTER => Some(match_reply(lparam as usize == token.address)),
            WM_VERIFY_ISLAND_HOST_TOKEN => Some(match_reply(
                lparam as usize == token.address && wparam as u64 == token.generation,
            )),
            _ => None,
        }
    }
}

fn match_reply(matches: bool) -> isize {
    if matches { POINTER_MATCH } else { POINTER_NO_MATCH }
}

pub fn identify(channel: &dyn MessageChannel, handle: NativeHandle) -> bool {
    !handle.is_null() && channel.send_message(handle, WM_QUERY_ISLAND_HOST, 0, 0) == HOST_IDENTIFIED
}

/// Fetches the owner token. Callers must have identified the handle first;
/// the reply of a foreign window to these messages means nothing.
pub fn resolve(channel: &dyn MessageChannel, handle: NativeHandle) -> Option<OwnerToken> {
    let address = channel.send_message(handle, WM_GET_ISLAND_HOST_POINTER, 0, 0) as usize;
    if address == 0 {
        return None;
    }
    let generation = channel.send_message(handle, WM_GET_ISLAND_HOST_GENERATION, 0, 0) as u64;
    Some(OwnerToken {
        address,
        generation,
    })
}

/// Asks the window whether `address` is its owner.
pub fn verify_pointer(channel: &dyn MessageChannel, handle: NativeHandle, address: usize) -> bool {
    channel.send_message(handle, WM_VERIFY_ISLAND_HOST_POINTER, 0, address as isize)
        == POINTER_MATCH
}

/// Asks the window whether `token` names its current owner, generation
/// included.
pub fn verify(channel: &dyn MessageChannel, handle: NativeHandle, token: OwnerToken) -> bool {
    channel.send_message(
        handle,
        WM_VERIFY_ISLAND_HOST_TOKEN,
        token.generation as usize,
        token.address as isize,
    ) == POINTER_MATCH
}

/// Identify, resolve and verify in one step.
pub fn lookup(channel: &dyn MessageChannel, handle: NativeHandle) -> Option<OwnerToken> {
    if !identify(channel, handle) {
        return None;
    }
    let token = resolve(channel, handle)?;
    (verify_pointer(channel, handle, token.address) && verify(channel, handle, token))
        .then_some(token)
}
