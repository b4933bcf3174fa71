//! Raw Input capture for the two tracked keys.
//!
//! Keyboard Raw Input is registered on a message-only window with
//! `RIDEV_INPUTSINK`, so every physical transition is delivered regardless
//! of focus. Each `WM_INPUT` payload is decoded into a [`KeyboardRecord`]
//! and classified:
//!
//! 1. Echoes of our own injected events are dropped before anything else.
//! 2. Keys other than the tracked pair are ignored.
//! 3. Remaining records become a tracked transition.
//!
//! Payloads that cannot be sized or read are dropped silently.

use crate::state::{EventOrigin, TrackedKey};

/// `RAWKEYBOARD::Flags` bit set on key release.
pub const KEY_BREAK_FLAG: u16 = 0x01;

/// Payloads up to this size are read into a stack buffer.
pub const STACK_PAYLOAD_SIZE: usize = 128;

/// HID usage page for generic desktop controls.
pub const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
/// HID usage ID for keyboards.
pub const HID_USAGE_KEYBOARD: u16 = 0x06;

/// The fields of a Raw Input keyboard report the filter cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardRecord {
    pub vkey: u16,
    pub flags: u16,
    pub extra_info: u32,
}

impl KeyboardRecord {
    #[inline(always)]
    pub fn origin(&self) -> EventOrigin {
        EventOrigin::from_extra_info(self.extra_info)
    }

    #[inline(always)]
    pub fn is_down(&self) -> bool {
        self.flags & KEY_BREAK_FLAG == 0
    }
}

/// Outcome of classifying a keyboard record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Our own injected event coming back; must not touch state.
    Echo,
    /// A key the filter does not track.
    Untracked,
    /// A genuine transition of a tracked key.
    Transition { key: TrackedKey, is_down: bool },
}

/// Classifies a decoded record. The origin check runs first.
#[inline(always)]
pub fn classify_keyboard(record: &KeyboardRecord) -> Capture {
    if crate::util::unlikely(record.origin() == EventOrigin::Injected) {
        return Capture::Echo;
    }

    match TrackedKey::from_vk(record.vkey) {
        Some(key) => Capture::Transition {
            key,
            is_down: record.is_down(),
        },
        None => Capture::Untracked,
    }
}

#[cfg(windows)]
pub use platform::{read_keyboard, register_keyboard};

#[cfg(windows)]
mod platform {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::*;

    use super::{HID_USAGE_KEYBOARD, HID_USAGE_PAGE_GENERIC, KeyboardRecord, STACK_PAYLOAD_SIZE};
    use crate::error::StartupError;
    use crate::util::{likely, unlikely};

    const HEADER_SIZE: u32 = std::mem::size_of::<RAWINPUTHEADER>() as u32;

    /// `RAWINPUT` needs pointer alignment; a plain byte array does not give it.
    #[repr(C, align(8))]
    struct StackPayload([u8; STACK_PAYLOAD_SIZE]);

    /// Registers the generic keyboard class with `hwnd` as the input sink.
    pub fn register_keyboard(hwnd: HWND) -> Result<(), StartupError> {
        let devices = [RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_KEYBOARD,
            dwFlags: RIDEV_INPUTSINK | RIDEV_NOLEGACY,
            hwndTarget: hwnd,
        }];

        unsafe {
            RegisterRawInputDevices(&devices, std::mem::size_of::<RAWINPUTDEVICE>() as u32)
                .map_err(StartupError::RegisterRawInput)
        }
    }

    /// Reads the keyboard report behind a `WM_INPUT` handle.
    ///
    /// Returns `None` for non-keyboard payloads and for any sizing or read
    /// failure.
    #[inline]
    pub fn read_keyboard(handle: HRAWINPUT) -> Option<KeyboardRecord> {
        let mut size = 0u32;
        let result = unsafe { GetRawInputData(handle, RID_INPUT, None, &mut size, HEADER_SIZE) };
        if unlikely(result != 0 || size == 0) {
            log::trace!("dropping raw input: size query failed");
            return None;
        }

        if likely(size as usize <= STACK_PAYLOAD_SIZE) {
            let mut buffer = StackPayload([0u8; STACK_PAYLOAD_SIZE]);
            unsafe { read_into(handle, buffer.0.as_mut_ptr(), size) }
        } else {
            // Oversized payloads are rare; a u64 vec keeps the alignment.
            let mut buffer = vec![0u64; (size as usize).div_ceil(8)];
            unsafe { read_into(handle, buffer.as_mut_ptr().cast(), size) }
        }
    }

    /// # Safety
    /// `buffer` must be valid for writes of `size` bytes and 8-byte aligned.
    #[inline(always)]
    unsafe fn read_into(handle: HRAWINPUT, buffer: *mut u8, mut size: u32) -> Option<KeyboardRecord> {
        let expected = size;
        let read = unsafe {
            GetRawInputData(handle, RID_INPUT, Some(buffer.cast()), &mut size, HEADER_SIZE)
        };
        if unlikely(read != expected) {
            log::trace!("dropping raw input: short read ({} of {} bytes)", read as i32, expected);
            return None;
        }

        let raw = unsafe { &*(buffer as *const RAWINPUT) };
        if unlikely(raw.header.dwType != RIM_TYPEKEYBOARD.0) {
            return None;
        }

        let keyboard = unsafe { &raw.data.keyboard };
        Some(KeyboardRecord {
            vkey: keyboard.VKey,
            flags: keyboard.Flags,
            extra_info: keyboard.ExtraInformation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SIMULATED_EVENT_MARKER;

    fn record(vkey: u16, flags: u16, extra_info: u32) -> KeyboardRecord {
        KeyboardRecord {
            vkey,
            flags,
            extra_info,
        }
    }

    #[test]
    fn test_classify_tracked_key_down_and_up() {
        assert_eq!(
            classify_keyboard(&record(0x41, 0, 0)),
            Capture::Transition {
                key: TrackedKey::Left,
                is_down: true
            }
        );
        assert_eq!(
            classify_keyboard(&record(0x44, KEY_BREAK_FLAG, 0)),
            Capture::Transition {
                key: TrackedKey::Right,
                is_down: false
            }
        );
    }

    #[test]
    fn test_classify_echo_wins_over_key_code() {
        assert_eq!(
            classify_keyboard(&record(0x41, 0, SIMULATED_EVENT_MARKER)),
            Capture::Echo
        );
        assert_eq!(
            classify_keyboard(&record(0x20, KEY_BREAK_FLAG, SIMULATED_EVENT_MARKER)),
            Capture::Echo
        );
    }

    #[test]
    fn test_classify_untracked_keys() {
        assert_eq!(classify_keyboard(&record(0x57, 0, 0)), Capture::Untracked); // W
        assert_eq!(classify_keyboard(&record(0x53, 0, 0)), Capture::Untracked); // S
        assert_eq!(classify_keyboard(&record(0x25, 0, 0)), Capture::Untracked); // LEFT arrow
    }

    #[test]
    fn test_classify_foreign_extra_info_is_physical() {
        // Other software tagging its own events is not our echo.
        assert_eq!(
            classify_keyboard(&record(0x41, 0, 0x4659)),
            Capture::Transition {
                key: TrackedKey::Left,
                is_down: true
            }
        );
    }

    #[test]
    fn test_extended_flags_do_not_mean_release() {
        // RI_KEY_E0 (0x02) alone is still a key-down.
        assert!(record(0x41, 0x02, 0).is_down());
        assert!(!record(0x41, 0x03, 0).is_down());
    }
}
