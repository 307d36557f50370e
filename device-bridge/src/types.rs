//! 领域类型定义

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// 外部工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// 设备列举工具（adb）
    DeviceLister,
    /// 投屏工具（scrcpy）
    MirrorLauncher,
}

impl Tool {
    /// 工具名（不含平台后缀）
    pub fn name(self) -> &'static str {
        match self {
            Tool::DeviceLister => "adb",
            Tool::MirrorLauncher => "scrcpy",
        }
    }

    /// 磁盘上的可执行文件名
    pub fn binary_name(self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }

    /// 覆盖路径的环境变量名
    pub fn override_env(self) -> &'static str {
        match self {
            Tool::DeviceLister => "DROIDCONNECT_ADB_PATH",
            Tool::MirrorLauncher => "DROIDCONNECT_SCRCPY_PATH",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一次调用内解析出的工具路径，不跨调用缓存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPath {
    pub tool: Tool,
    pub path: PathBuf,
}

impl ToolPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

/// 设备状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceState {
    /// 已连接且已授权
    Ready,
    Unauthorized,
    Offline,
    /// 其他状态（recovery、sideload、no permissions 等）
    Other(String),
}

/// 解析出的设备条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// 设备序列号
    pub serial: String,
    pub state: DeviceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_id: Option<String>,
}

impl DeviceRecord {
    pub fn new(serial: impl Into<String>, state: DeviceState) -> Self {
        Self {
            serial: serial.into(),
            state,
            product: None,
            model: None,
            device: None,
            transport_id: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Ready
    }
}

/// 同步执行的输出（stdout + stderr 合并）
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub text: String,
    /// 退出码，被信号终止时为 None
    pub exit_code: Option<i32>,
}
