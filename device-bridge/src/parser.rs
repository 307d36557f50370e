//! `adb devices [-l]` 输出解析
//!
//! 典型输出：
//! ```text
//! List of devices attached
//! emulator-5554          device product:sdk_gphone64_arm64 model:sdk_gphone64_arm64 device:emu64a transport_id:1
//! ZY22D3ABC              unauthorized usb:3-4 transport_id:2
//! ```
//!
//! 只保留处于 ready 状态的设备，按首次出现顺序去重。

use crate::types::{DeviceRecord, DeviceState};
use std::collections::HashSet;
use tracing::trace;

const HEADER_PHRASE: &str = "list of devices";
const READY_MARKER: &str = "device";
const EXCLUDED_MARKERS: &[&str] = &["unauthorized", "offline"];

/// 解析为设备条目（只包含 ready 设备）
pub fn parse_device_records(raw: &str) -> Vec<DeviceRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for line in raw.split('\n') {
        let line = line.trim();
        if line.is_empty() || is_header(line) || line.starts_with('*') {
            continue;
        }

        let Some(record) = parse_line(line) else {
            trace!("[Parser] Skipping line: {:?}", line);
            continue;
        };

        if !record.is_ready() {
            trace!("[Parser] Device {} not ready: {:?}", record.serial, record.state);
            continue;
        }

        if seen.insert(record.serial.clone()) {
            records.push(record);
        }
    }

    records
}

/// 解析为序列号列表
pub fn parse_device_serials(raw: &str) -> Vec<String> {
    parse_device_records(raw)
        .into_iter()
        .map(|record| record.serial)
        .collect()
}

fn is_header(line: &str) -> bool {
    line.to_lowercase().contains(HEADER_PHRASE)
}

/// 解析单行，序列号为空时返回 None
fn parse_line(line: &str) -> Option<DeviceRecord> {
    let mut tokens = line.split_whitespace();
    let serial = tokens.next().filter(|s| !s.is_empty())?;
    let rest: Vec<&str> = tokens.collect();

    let state = classify(line, &rest);
    let mut record = DeviceRecord::new(serial, state);

    for token in &rest {
        if let Some((key, value)) = token.split_once(':') {
            if value.is_empty() {
                continue;
            }
            match key {
                "product" => record.product = Some(value.to_string()),
                "model" => record.model = Some(value.to_string()),
                "device" => record.device = Some(value.to_string()),
                "transport_id" => record.transport_id = Some(value.to_string()),
                _ => {}
            }
        }
    }

    Some(record)
}

/// 排除标记对整行生效（包括序列号），并且优先于 ready 标记
fn classify(line: &str, rest: &[&str]) -> DeviceState {
    for marker in EXCLUDED_MARKERS {
        if line.contains(*marker) {
            return match *marker {
                "unauthorized" => DeviceState::Unauthorized,
                _ => DeviceState::Offline,
            };
        }
    }

    if rest.iter().any(|token| *token == READY_MARKER) {
        DeviceState::Ready
    } else {
        DeviceState::Other(rest.first().copied().unwrap_or_default().to_string())
    }
}
