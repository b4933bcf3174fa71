//! Synthetic key event submission.

#[cfg(windows)]
use windows::Win32::UI::Input::KeyboardAndMouse::*;

use super::types::*;

/// Submits synthetic events through `SendInput`, tagged with
/// [`SIMULATED_EVENT_MARKER`].
///
/// Each event is a separate `SendInput` call so a release is fully queued
/// before the following press.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct SendInputInjector {
    failures: u64,
}

#[cfg(windows)]
impl SendInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of submissions the OS rejected so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    #[inline(always)]
    fn keyboard_input(event: SyntheticEvent) -> INPUT {
        let flags = if event.pressed {
            KEYBD_EVENT_FLAGS(0)
        } else {
            KEYEVENTF_KEYUP
        };

        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(event.key.vk()),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: SIMULATED_EVENT_MARKER as usize,
                },
            },
        }
    }
}

#[cfg(windows)]
impl KeyInjector for SendInputInjector {
    #[inline]
    fn inject(&mut self, event: SyntheticEvent) {
        let input = Self::keyboard_input(event);
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };

        // Not retried: physical state may already have moved on.
        if crate::util::unlikely(sent == 0) {
            self.failures += 1;
            log::debug!("SendInput rejected {}", event);
        }
    }
}

/// Injector that records events in submission order instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct RecordingInjector {
    events: Vec<SyntheticEvent>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SyntheticEvent] {
        &self.events
    }

    /// Returns the recorded events and clears the log.
    pub fn take(&mut self) -> Vec<SyntheticEvent> {
        std::mem::take(&mut self.events)
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&mut self, event: SyntheticEvent) {
        self.events.push(event);
    }
}
