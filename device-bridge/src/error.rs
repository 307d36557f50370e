//! Bridge 错误定义

use crate::types::Tool;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{tool} binary not found in any candidate location")]
    ToolUnavailable { tool: Tool },

    #[error("Failed to launch {} {args:?}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("{} did not exit within {timeout:?}", .path.display())]
    TimedOut { path: PathBuf, timeout: Duration },

    #[error("Failed to capture output of {}: {source}", .path.display())]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid device id: {0:?}")]
    InvalidDeviceId(String),

    #[error("Unknown request: {0:?}")]
    UnknownRequest(String),
}

impl BridgeError {
    /// 返回给 UI 的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::ToolUnavailable { .. } => "toolUnavailable",
            BridgeError::Launch { .. } => "launchFailed",
            BridgeError::TimedOut { .. } => "timedOut",
            BridgeError::Capture { .. } => "captureFailed",
            BridgeError::InvalidDeviceId(_) => "invalidDeviceId",
            BridgeError::UnknownRequest(_) => "unknownRequest",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BridgeError::ToolUnavailable {
            tool: Tool::MirrorLauncher,
        };
        assert_eq!(err.code(), "toolUnavailable");
        assert!(err.to_string().contains("scrcpy"));

        let err = BridgeError::UnknownRequest("device_required_files".into());
        assert_eq!(err.code(), "unknownRequest");
    }

    #[test]
    fn test_launch_error_message() {
        let err = BridgeError::Launch {
            path: PathBuf::from("/usr/bin/adb"),
            args: vec!["devices".into(), "-l".into()],
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/adb"));
        assert!(msg.contains("\"devices\""));
        assert_eq!(err.code(), "launchFailed");
    }
}
