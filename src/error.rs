//! Fatal startup errors.
//!
//! Only startup can fail the process. Per-event failures are absorbed where
//! they happen and never reach this type.

/// Error type returned by the platform layer.
#[cfg(windows)]
pub type PlatformError = windows::core::Error;
#[cfg(not(windows))]
pub type PlatformError = std::io::Error;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to get module handle: {0}")]
    ModuleHandle(#[source] PlatformError),
    #[error("failed to register window class: {0}")]
    RegisterClass(#[source] PlatformError),
    #[error("failed to create message-only window: {0}")]
    CreateWindow(#[source] PlatformError),
    #[error("failed to register raw input device: {0}")]
    RegisterRawInput(#[source] PlatformError),
    #[error("failed to install console control handler: {0}")]
    ConsoleHandler(#[source] PlatformError),
    #[error("this platform has no raw keyboard input support")]
    Unsupported,
}
