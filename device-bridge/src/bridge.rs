//! Device Bridge 实现
//!
//! 组合 locator / runner / parser，对外只暴露两个操作：列举设备、启动投屏。
//! 每次调用都重新定位工具、重新执行，不保存任何调用间状态。

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::locator::ToolLocator;
use crate::parser;
use crate::request::{BridgeRequest, BridgeResponse};
use crate::runner;
use crate::types::{DeviceRecord, Tool, ToolPath};
use tracing::{error, info, warn};

/// 校验设备 ID
///
/// 以 `-` 开头的值会被 scrcpy 当作选项，直接拒绝
fn validate_device_id(device_id: &str) -> Result<()> {
    if device_id.is_empty()
        || device_id.starts_with('-')
        || device_id.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(BridgeError::InvalidDeviceId(device_id.to_string()));
    }
    Ok(())
}

/// Device Bridge
///
/// 启动时创建一次，通过引用或 `Arc` 传给需要的地方
#[derive(Debug, Clone)]
pub struct DeviceBridge {
    config: BridgeConfig,
}

impl DeviceBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn locate(&self, tool: Tool) -> Result<ToolPath> {
        ToolLocator::from_config(&self.config)
            .locate(tool)
            .ok_or(BridgeError::ToolUnavailable { tool })
    }

    /// 列举 ready 设备的序列号
    ///
    /// 任何失败都记录日志并返回空列表
    pub async fn list_devices(&self) -> Vec<String> {
        match self.list_device_records().await {
            Ok(records) => records.into_iter().map(|r| r.serial).collect(),
            Err(e) => {
                warn!("[DeviceBridge] Listing devices failed: {}", e);
                Vec::new()
            }
        }
    }

    /// 列举 ready 设备的完整条目
    pub async fn list_device_records(&self) -> Result<Vec<DeviceRecord>> {
        let adb = self.locate(Tool::DeviceLister)?;
        let args = &self.config.list_args;

        let output = runner::run_captured(adb.as_path(), args, self.config.capture_timeout)
            .await
            .map_err(|e| {
                error!("[DeviceBridge] {} {:?} failed: {:?}", adb.path.display(), args, e);
                e
            })?;

        let records = parser::parse_device_records(&output.text);
        info!(
            "[DeviceBridge] Found {} ready device(s) via {}",
            records.len(),
            adb.path.display()
        );
        Ok(records)
    }

    /// 为指定设备启动投屏，返回 scrcpy 的 pid
    ///
    /// 启动后立即返回，不确认投屏窗口是否真正建立
    pub async fn start_mirroring(&self, device_id: &str) -> Result<u32> {
        validate_device_id(device_id)?;

        let scrcpy = self.locate(Tool::MirrorLauncher).map_err(|e| {
            warn!("[DeviceBridge] Cannot mirror {}: {}", device_id, e);
            e
        })?;

        let mut args = vec!["-s".to_string(), device_id.to_string()];
        args.extend(self.config.mirror_extra_args.iter().cloned());

        runner::run_detached(scrcpy.as_path(), &args).map_err(|e| {
            error!("[DeviceBridge] Mirroring {} failed: {:?}", device_id, e);
            e
        })
    }

    /// 处理类型化请求
    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        match request {
            BridgeRequest::ListDevices => BridgeResponse::Devices {
                devices: self.list_devices().await,
            },
            BridgeRequest::StartMirroring { device_id } => {
                match self.start_mirroring(&device_id).await {
                    Ok(pid) => BridgeResponse::MirroringStarted { device_id, pid },
                    Err(e) => e.into(),
                }
            }
        }
    }

    /// 处理 UI 原始消息
    pub async fn handle_message(&self, message: &str) -> BridgeResponse {
        match BridgeRequest::parse(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("[DeviceBridge] Rejected message: {}", e);
                e.into()
            }
        }
    }
}

impl Default for DeviceBridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}
