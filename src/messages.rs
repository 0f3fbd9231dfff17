/*
 * Portable copies of the Win32 message and virtual-key values the focus core
 * interprets. The core compiles on every platform, so it cannot pull these from
 * the `windows` crate; the Windows-only tests below pin them to the real values.
 */

pub const WM_DESTROY: u32 = 0x0002;
pub const WM_ACTIVATE: u32 = 0x0006;
pub const WM_SETFOCUS: u32 = 0x0007;
pub const WM_NCDESTROY: u32 = 0x0082;
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_USER: u32 = 0x0400;

/// Low word of `WM_ACTIVATE`'s wparam when the window is being deactivated.
pub const WA_INACTIVE: u32 = 0;

pub const VK_TAB: u16 = 0x09;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_MENU: u16 = 0x12;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;

/// Bit set in a `GetKeyboardState` entry while the key is held.
pub const KEY_DOWN_MASK: u8 = 0x80;

#[inline]
pub fn loword(value: usize) -> u32 {
    (value & 0xFFFF) as u32
}

#[cfg(all(test, target_os = "windows"))]
mod tests {
    use super::*;
    use windows::Win32::UI::Input::KeyboardAndMouse as kbm;
    use windows::Win32::UI::WindowsAndMessaging as wm;

    #[test]
    fn message_constants_match_win32() {
        assert_eq!(WM_DESTROY, wm::WM_DESTROY);
        assert_eq!(WM_ACTIVATE, wm::WM_ACTIVATE);
        assert_eq!(WM_SETFOCUS, wm::WM_SETFOCUS);
        assert_eq!(WM_NCDESTROY, wm::WM_NCDESTROY);
        assert_eq!(WM_KEYDOWN, wm::WM_KEYDOWN);
        assert_eq!(WM_USER, wm::WM_USER);
        assert_eq!(WA_INACTIVE, wm::WA_INACTIVE);
    }

    #[test]
    fn virtual_keys_match_win32() {
        assert_eq!(VK_TAB, kbm::VK_TAB.0);
        assert_eq!(VK_SHIFT, kbm::VK_SHIFT.0);
        assert_eq!(VK_MENU, kbm::VK_MENU.0);
        assert_eq!(VK_LEFT, kbm::VK_LEFT.0);
        assert_eq!(VK_UP, kbm::VK_UP.0);
        assert_eq!(VK_RIGHT, kbm::VK_RIGHT.0);
        assert_eq!(VK_DOWN, kbm::VK_DOWN.0);
    }
}
