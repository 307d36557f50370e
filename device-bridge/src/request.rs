//! UI 请求与响应
//!
//! Web 页面通过消息通道发送一个字符串，支持两种格式：
//! - JSON：`{"action":"listDevices"}`、`{"action":"startMirroring","deviceId":"X"}`
//! - 旧格式：`list_devices`、`start_mirroring:<id>`
//!
//! 其他值一律视为未知请求，不做静默忽略。

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

const LEGACY_LIST: &str = "list_devices";
const LEGACY_MIRROR_PREFIX: &str = "start_mirroring:";

/// UI → Bridge 请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// 列举设备
    ListDevices,
    /// 为指定设备启动投屏
    StartMirroring {
        #[serde(rename = "deviceId")]
        device_id: String,
    },
}

impl BridgeRequest {
    /// 解析 UI 消息
    pub fn parse(message: &str) -> Result<Self> {
        let trimmed = message.trim();

        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed)
                .map_err(|_| BridgeError::UnknownRequest(trimmed.to_string()));
        }

        if trimmed == LEGACY_LIST {
            return Ok(BridgeRequest::ListDevices);
        }

        if let Some(device_id) = trimmed.strip_prefix(LEGACY_MIRROR_PREFIX) {
            return Ok(BridgeRequest::StartMirroring {
                device_id: device_id.trim().to_string(),
            });
        }

        Err(BridgeError::UnknownRequest(trimmed.to_string()))
    }
}

/// Bridge → UI 响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum BridgeResponse {
    Devices {
        devices: Vec<String>,
    },
    MirroringStarted {
        #[serde(rename = "deviceId")]
        device_id: String,
        pid: u32,
    },
    Error {
        code: String,
        message: String,
    },
}

impl BridgeResponse {
    pub fn to_json(&self) -> String {
        // 只包含字符串和数字，序列化不会失败
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","code":"serialization","message":"failed to encode response"}"#
                .to_string()
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, BridgeResponse::Error { .. })
    }
}

impl From<BridgeError> for BridgeResponse {
    fn from(err: BridgeError) -> Self {
        BridgeResponse::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
