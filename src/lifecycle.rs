//! Startup, message loop and shutdown.
//!
//! Everything runs on the thread that calls [`run`]. The pipeline lives on
//! that thread's stack and is reachable from the window procedure through
//! `GWLP_USERDATA` only while the loop is pumping.

use std::cell::RefCell;

use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Console::SetConsoleTitleW;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::HRAWINPUT;
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::PCWSTR;

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::pipeline::Pipeline;
use crate::rawinput;
use crate::signal;
use crate::state::SendInputInjector;

/// Window class name for the message-only input window.
const WINDOW_CLASS: &str = "SocdResolverRawInputWindow";
const WINDOW_TITLE: &str = "SOCD Injector";
const CONSOLE_TITLE: &str = "SOCD software resolver";

/// `ERROR_CLASS_ALREADY_EXISTS`
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

type FilterPipeline = Pipeline<SendInputInjector>;

/// Converts a string to null-terminated UTF-16 for Windows APIs.
fn to_wstring(s: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Message-only window plus its class registration.
///
/// Dropping it destroys the window and unregisters the class, so a failure
/// halfway through startup leaves nothing behind.
struct FilterWindow {
    hwnd: Option<HWND>,
    instance: HINSTANCE,
    class_name: Vec<u16>,
}

impl FilterWindow {
    fn create() -> Result<Self, StartupError> {
        let module = unsafe { GetModuleHandleW(None) }.map_err(StartupError::ModuleHandle)?;
        let instance = HINSTANCE(module.0);
        let class_name = to_wstring(WINDOW_CLASS);

        let wc = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };

        if unsafe { RegisterClassW(&wc) } == 0 {
            let last_error = unsafe { GetLastError() };
            if last_error.0 != ERROR_CLASS_ALREADY_EXISTS {
                return Err(StartupError::RegisterClass(last_error.to_hresult().into()));
            }
        }

        let mut window = Self {
            hwnd: None,
            instance,
            class_name,
        };

        let title = to_wstring(WINDOW_TITLE);
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(window.class_name.as_ptr()),
                PCWSTR(title.as_ptr()),
                WINDOW_STYLE(0),
                0,
                0,
                0,
                0,
                Some(HWND_MESSAGE),
                None,
                Some(instance),
                None,
            )
        }
        .map_err(StartupError::CreateWindow)?;

        window.hwnd = Some(hwnd);
        Ok(window)
    }

    fn hwnd(&self) -> HWND {
        self.hwnd.unwrap_or_default()
    }

    fn attach(&self, pipeline: &RefCell<FilterPipeline>) {
        unsafe {
            SetWindowLongPtrW(self.hwnd(), GWLP_USERDATA, pipeline as *const _ as isize);
        }
    }

    fn detach(&self) {
        unsafe {
            SetWindowLongPtrW(self.hwnd(), GWLP_USERDATA, 0);
        }
    }
}

impl Drop for FilterWindow {
    fn drop(&mut self) {
        unsafe {
            if let Some(hwnd) = self.hwnd.take() {
                let _ = DestroyWindow(hwnd);
            }
            let _ = UnregisterClassW(PCWSTR(self.class_name.as_ptr()), Some(self.instance));
        }
    }
}

/// Runs the filter until the window is closed.
///
/// Returns the `WM_QUIT` exit code. Only startup can fail.
pub fn run(config: &AppConfig) -> Result<i32, StartupError> {
    let window = FilterWindow::create()?;
    rawinput::register_keyboard(window.hwnd())?;
    let notifier = signal::install(window.hwnd(), config.shutdown_grace())?;

    let pipeline = RefCell::new(Pipeline::new(SendInputInjector::new()));
    window.attach(&pipeline);

    if config.show_status {
        show_status();
    }
    log::info!("SOCD resolution active (A = left, D = right)");

    let exit_code = pump_messages();

    window.detach();
    let mut pipeline = pipeline.into_inner();
    pipeline.shutdown();
    let failures = pipeline.injector().failures();
    if failures > 0 {
        log::debug!("{} synthetic submissions were rejected", failures);
    }

    // Window and class go only after the release has been submitted.
    drop(window);
    notifier.notify();
    log::info!("SOCD resolver stopped");

    Ok(exit_code)
}

fn pump_messages() -> i32 {
    let mut msg = MSG::default();
    unsafe {
        loop {
            let result = GetMessageW(&mut msg, None, 0, 0);

            if result.0 == 0 {
                return msg.wParam.0 as i32;
            }
            if result.0 == -1 {
                log::error!("GetMessageW failed: {:?}", GetLastError());
                return 1;
            }

            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

fn show_status() {
    let title = to_wstring(CONSOLE_TITLE);
    unsafe {
        let _ = SetConsoleTitleW(PCWSTR(title.as_ptr()));
    }
    println!("SOCD resolution is currently active. Keep this process active.");
}

#[allow(non_snake_case)]
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match msg {
        WM_INPUT => unsafe {
            let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const RefCell<FilterPipeline>;
            if !ptr.is_null()
                && let Ok(mut pipeline) = (*ptr).try_borrow_mut()
                && let Some(record) = rawinput::read_keyboard(HRAWINPUT(l_param.0 as _))
            {
                pipeline.handle_record(&record);
            }
            DefWindowProcW(hwnd, msg, w_param, l_param)
        },
        WM_CLOSE | WM_DESTROY => unsafe {
            PostQuitMessage(0);
            LRESULT(0)
        },
        _ => unsafe { DefWindowProcW(hwnd, msg, w_param, l_param) },
    }
}
