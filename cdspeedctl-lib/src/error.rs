use crate::sg::SgStatus;
use nix::errno::Errno;
use thiserror::Error;

/// Convenient result type for `cdspeedctl-lib`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device {path} not ready after {attempts} attempt(s): {source}")]
    DeviceNotReady {
        path: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("CDROM_SELECT_SPEED on {path} failed: {cause}")]
    PrimaryInterfaceFailed { path: String, cause: InterfaceFailure },

    #[error("SG_IO SET CD SPEED on {path} failed: {cause}")]
    FallbackInterfaceFailed { path: String, cause: InterfaceFailure },

    #[error("CDROM_GET_SPEED on {path} failed: {cause}")]
    QueryFailed { path: String, cause: InterfaceFailure },

    #[error("failed to set speed after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Why a single device interaction failed.
///
/// Only used for diagnostics; callers branch on the outer [`Error`] variant.
#[derive(Debug, Error)]
pub enum InterfaceFailure {
    #[error("could not open device: {0}")]
    Open(#[source] std::io::Error),

    #[error("request rejected: {0}")]
    Rejected(#[source] Errno),

    #[error("transport error: {0}")]
    Transport(#[source] Errno),

    #[error("command not completed: {0}")]
    CheckCondition(SgStatus),
}
