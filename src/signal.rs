//! Console control handling.
//!
//! Ctrl+C, Ctrl+Break and closing the console all route through the filter
//! window's normal close path, so an outstanding synthetic key is released
//! before the process goes away.

use std::sync::OnceLock;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::System::Console::*;
use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, WM_CLOSE};
use windows::core::*;

use crate::error::StartupError;

struct ShutdownLink {
    /// Raw `HWND` value; the handle itself is not `Sync`.
    hwnd: isize,
    done: Receiver<()>,
    grace: Duration,
}

static SHUTDOWN_LINK: OnceLock<ShutdownLink> = OnceLock::new();

/// Signals the console handler that shutdown has finished.
pub struct ShutdownNotifier {
    done: Sender<()>,
}

impl ShutdownNotifier {
    pub fn notify(&self) {
        let _ = self.done.try_send(());
    }
}

/// Installs the console handler for the window `hwnd`.
///
/// The handler waits at most `grace` for [`ShutdownNotifier::notify`].
pub fn install(hwnd: HWND, grace: Duration) -> std::result::Result<ShutdownNotifier, StartupError> {
    let (tx, rx) = bounded(1);
    let link = ShutdownLink {
        hwnd: hwnd.0 as isize,
        done: rx,
        grace,
    };
    if SHUTDOWN_LINK.set(link).is_err() {
        log::warn!("console handler already linked to a window");
    }

    unsafe { SetConsoleCtrlHandler(Some(console_handler), true) }
        .map_err(StartupError::ConsoleHandler)?;

    Ok(ShutdownNotifier { done: tx })
}

#[allow(non_snake_case)]
unsafe extern "system" fn console_handler(ctrl_type: u32) -> BOOL {
    match ctrl_type {
        CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
            let Some(link) = SHUTDOWN_LINK.get() else {
                return BOOL(0); // no window yet: default handler terminates
            };

            let hwnd = HWND(link.hwnd as *mut std::ffi::c_void);
            if unsafe { PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0)) }.is_err() {
                return BOOL(0);
            }

            // The process may be torn down as soon as this returns.
            if link.done.recv_timeout(link.grace).is_err() {
                log::warn!("event loop did not finish within {:?}", link.grace);
            }
            BOOL(1)
        }
        _ => BOOL(0),
    }
}
