/*
 * Navigation vocabulary shared by the native side and the embedded runtime:
 * why focus is moving (`NavigationReason`), which way through the tab order that
 * implies, and the correlated request object that pairs an outbound hand-off
 * with the exit request the island later raises.
 */
use crate::messages::{VK_DOWN, VK_LEFT, VK_RIGHT, VK_TAB, VK_UP};
use crate::types::{HintRect, KeyboardState};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationReason {
    First,
    Last,
    Left,
    Right,
    Up,
    Down,
    /// Re-focus the element the island remembered. Only used to confirm a
    /// hand-off, so it has no direction.
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    Forward,
    Backward,
}

impl NavigationDirection {
    pub fn is_backward(self) -> bool {
        self == NavigationDirection::Backward
    }
}

impl NavigationReason {
    pub fn direction(self) -> Option<NavigationDirection> {
        match self {
            NavigationReason::First | NavigationReason::Down | NavigationReason::Right => {
                Some(NavigationDirection::Forward)
            }
            NavigationReason::Last | NavigationReason::Left | NavigationReason::Up => {
                Some(NavigationDirection::Backward)
            }
            NavigationReason::Restore => None,
        }
    }
}

/// Maps a key-down virtual key to a navigation reason. Tab goes to `First`, or
/// to `Last` while Shift is held.
pub fn reason_from_key(virtual_key: u16, keyboard: &KeyboardState) -> Option<NavigationReason> {
    match virtual_key {
        VK_TAB if keyboard.shift_down() => Some(NavigationReason::Last),
        VK_TAB => Some(NavigationReason::First),
        VK_LEFT => Some(NavigationReason::Left),
        VK_RIGHT => Some(NavigationReason::Right),
        VK_UP => Some(NavigationReason::Up),
        VK_DOWN => Some(NavigationReason::Down),
        _ => None,
    }
}

/// Inverse of `reason_from_key`, used to replay an island's exit through the
/// native tab order. `Restore` has no key.
pub fn key_from_reason(reason: NavigationReason) -> Option<u16> {
    match reason {
        NavigationReason::First | NavigationReason::Last => Some(VK_TAB),
        NavigationReason::Left => Some(VK_LEFT),
        NavigationReason::Right => Some(VK_RIGHT),
        NavigationReason::Up => Some(VK_UP),
        NavigationReason::Down => Some(VK_DOWN),
        NavigationReason::Restore => None,
    }
}

/// Opaque token pairing a navigation request with the exit request it causes.
/// Fresh ids are random, so an id is never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an id minted by the embedded runtime.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationRequest {
    pub correlation_id: CorrelationId,
    pub reason: NavigationReason,
    pub hint: Option<HintRect>,
}

impl NavigationRequest {
    pub fn new(reason: NavigationReason) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            reason,
            hint: None,
        }
    }

    pub fn with_hint(reason: NavigationReason, hint: HintRect) -> Self {
        Self {
            hint: Some(hint),
            ..Self::new(reason)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationResult {
    pub was_moved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{VK_MENU, VK_SHIFT};

    const ALL_REASONS: [NavigationReason; 7] = [
        NavigationReason::First,
        NavigationReason::Last,
        NavigationReason::Left,
        NavigationReason::Right,
        NavigationReason::Up,
        NavigationReason::Down,
        NavigationReason::Restore,
    ];

    #[test]
    fn forward_and_backward_reasons() {
        for reason in [
            NavigationReason::First,
            NavigationReason::Down,
            NavigationReason::Right,
        ] {
            assert_eq!(reason.direction(), Some(NavigationDirection::Forward));
        }
        for reason in [
            NavigationReason::Last,
            NavigationReason::Left,
            NavigationReason::Up,
        ] {
            assert_eq!(reason.direction(), Some(NavigationDirection::Backward));
        }
        assert_eq!(NavigationReason::Restore.direction(), None);
    }

    #[test]
    fn tab_resolves_by_shift_bit_alone() {
        // Vary every other modifier; only Shift decides First/Last.
        for alt in [false, true] {
            let mut keyboard = KeyboardState::default();
            if alt {
                keyboard = keyboard.with_key_down(VK_MENU);
            }
            assert_eq!(
                reason_from_key(VK_TAB, &keyboard),
                Some(NavigationReason::First)
            );
            assert_eq!(
                reason_from_key(VK_TAB, &keyboard.with_key_down(VK_SHIFT)),
                Some(NavigationReason::Last)
            );
        }
    }

    #[test]
    fn arrows_map_regardless_of_shift() {
        let shifted = KeyboardState::default().with_key_down(VK_SHIFT);
        assert_eq!(
            reason_from_key(VK_LEFT, &shifted),
            Some(NavigationReason::Left)
        );
        assert_eq!(
            reason_from_key(VK_DOWN, &KeyboardState::default()),
            Some(NavigationReason::Down)
        );
        assert_eq!(reason_from_key(0x41, &KeyboardState::default()), None);
    }

    #[test]
    fn key_mapping_inverts_for_every_directional_reason() {
        for reason in ALL_REASONS {
            match key_from_reason(reason) {
                Some(key) => {
                    let keyboard = if reason == NavigationReason::Last {
                        KeyboardState::default().with_key_down(VK_SHIFT)
                    } else {
                        KeyboardState::default()
                    };
                    assert_eq!(reason_from_key(key, &keyboard), Some(reason));
                }
                None => assert_eq!(reason, NavigationReason::Restore),
            }
        }
    }

    #[test]
    fn fresh_requests_never_share_an_id() {
        let ids: std::collections::HashSet<_> = (0..64)
            .map(|_| NavigationRequest::new(NavigationReason::First).correlation_id)
            .collect();
        assert_eq!(ids.len(), 64);
    }
}
