//! Device Bridge - Android 设备发现与投屏启动
//!
//! 提供给 DroidConnect 桌面壳调用：
//! - 定位 adb / scrcpy
//! - 执行 `adb devices -l` 并解析 ready 设备
//! - 以分离进程方式启动 `scrcpy -s <serial>`

mod bridge;
pub mod config;
mod error;
pub mod locator;
pub mod parser;
mod request;
pub mod runner;
#[cfg(all(test, unix))]
mod testutil;
pub mod types;

pub use bridge::DeviceBridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use locator::ToolLocator;
pub use parser::{parse_device_records, parse_device_serials};
pub use request::{BridgeRequest, BridgeResponse};
pub use types::*;
