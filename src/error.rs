/*
 * Error vocabulary shared by the focus core and the Win32 backend.
 *
 * Lookup misses (unknown handle, no next tab stop, no matching island) are not
 * errors and are expressed as `Option::None` by the callers. Everything that ends
 * up here is either a setup failure or a focus-transfer failure, and both are
 * propagated to the pump, which stops routing and hands the error to the process
 * boundary.
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("focus transfer failed: {0}")]
    FocusTransferFailed(String),
    #[error("window identity association failed: {0}")]
    IdentityAssociationFailed(String),
    #[error("island {0} is closed")]
    IslandClosed(String),
    #[cfg(target_os = "windows")]
    #[error(transparent)]
    Win32(#[from] windows::core::Error),
}

pub type Result<T> = std::result::Result<T, PlatformError>;
