//! Bridge 配置
//!
//! 默认值从环境变量读取，CLI / FFI 可以在此基础上覆盖。

use crate::types::Tool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// 同步执行的默认超时（秒）
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 10;

/// Bridge 配置
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// 应用内置工具目录（按顺序查找）
    pub bundle_dirs: Vec<PathBuf>,
    /// 系统安装目录（在内置目录之后查找）
    pub system_dirs: Vec<PathBuf>,
    /// Android SDK 根目录，只用于查找 adb
    pub sdk_roots: Vec<PathBuf>,
    /// 显式指定的工具路径，优先级最高
    pub tool_overrides: HashMap<Tool, PathBuf>,
    /// 是否在 PATH 中查找
    pub search_path: bool,
    /// 同步执行的最长等待时间
    pub capture_timeout: Duration,
    /// 列举设备的参数
    pub list_args: Vec<String>,
    /// 追加在 `-s <serial>` 之后的投屏参数
    pub mirror_extra_args: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut bundle_dirs = Vec::new();
        if let Ok(dir) = std::env::var("DROIDCONNECT_BUNDLE_DIR") {
            if !dir.is_empty() {
                bundle_dirs.push(PathBuf::from(dir));
            }
        }
        bundle_dirs.extend(executable_bundle_dirs());

        let mut tool_overrides = HashMap::new();
        for tool in [Tool::DeviceLister, Tool::MirrorLauncher] {
            if let Ok(path) = std::env::var(tool.override_env()) {
                if !path.is_empty() {
                    tool_overrides.insert(tool, PathBuf::from(path));
                }
            }
        }

        let capture_timeout = std::env::var("DROIDCONNECT_CAPTURE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CAPTURE_TIMEOUT_SECS);

        let search_path = !std::env::var("DROIDCONNECT_NO_PATH_SEARCH")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);

        Self {
            bundle_dirs,
            system_dirs: default_system_dirs(),
            sdk_roots: android_sdk_roots(),
            tool_overrides,
            search_path,
            capture_timeout: Duration::from_secs(capture_timeout),
            list_args: vec!["devices".to_string(), "-l".to_string()],
            mirror_extra_args: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// 只在给定目录中查找工具，不读取环境变量
    ///
    /// 测试和嵌入方需要完全可控的候选列表时使用
    pub fn isolated(bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle_dirs: vec![bundle_dir.into()],
            system_dirs: Vec::new(),
            sdk_roots: Vec::new(),
            tool_overrides: HashMap::new(),
            search_path: false,
            capture_timeout: Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS),
            list_args: vec!["devices".to_string(), "-l".to_string()],
            mirror_extra_args: Vec::new(),
        }
    }

    pub fn with_bundle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundle_dirs.insert(0, dir.into());
        self
    }

    pub fn with_tool_override(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.tool_overrides.insert(tool, path.into());
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }
}

/// 可执行文件所在目录，以及 macOS app bundle 的 Resources 目录
fn executable_bundle_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
            // Contents/MacOS/<exe> -> Contents/Resources
            if let Some(contents) = dir.parent() {
                dirs.push(contents.join("Resources"));
            }
        }
    }
    dirs
}

fn default_system_dirs() -> Vec<PathBuf> {
    ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

fn android_sdk_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value);
            if !roots.contains(&path) {
                roots.push(path);
            }
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        roots.push(home.join("Library/Android/sdk"));
        roots.push(home.join("Android/Sdk"));
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_devices_long() {
        let config = BridgeConfig::default();
        assert_eq!(config.list_args, vec!["devices", "-l"]);
        assert!(config.capture_timeout > Duration::ZERO);
        assert_eq!(config.system_dirs[0], PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_isolated_config() {
        let config = BridgeConfig::isolated("/tmp/bundle")
            .with_tool_override(Tool::MirrorLauncher, "/opt/scrcpy/scrcpy")
            .with_capture_timeout(Duration::from_secs(3));

        assert_eq!(config.bundle_dirs, vec![PathBuf::from("/tmp/bundle")]);
        assert!(config.system_dirs.is_empty());
        assert!(config.sdk_roots.is_empty());
        assert!(!config.search_path);
        assert_eq!(config.capture_timeout, Duration::from_secs(3));
        assert_eq!(
            config.tool_overrides.get(&Tool::MirrorLauncher),
            Some(&PathBuf::from("/opt/scrcpy/scrcpy"))
        );
    }

    #[test]
    fn test_bundle_dir_takes_precedence() {
        let config = BridgeConfig::isolated("/b").with_bundle_dir("/a");
        assert_eq!(config.bundle_dirs[0], PathBuf::from("/a"));
    }

    #[test]
    fn test_default_search_order() {
        let config = BridgeConfig::default();

        // 环境变量指定的目录在最前，其后是可执行文件目录与 Resources
        let exe_dirs = executable_bundle_dirs();
        assert!(config.bundle_dirs.ends_with(&exe_dirs));
        match std::env::var("DROIDCONNECT_BUNDLE_DIR") {
            Ok(dir) if !dir.is_empty() => {
                assert_eq!(config.bundle_dirs[0], PathBuf::from(dir));
                assert_eq!(config.bundle_dirs.len(), exe_dirs.len() + 1);
            }
            _ => assert_eq!(config.bundle_dirs, exe_dirs),
        }
        if let [exe_dir, resources] = exe_dirs.as_slice() {
            assert_eq!(resources.file_name().unwrap(), "Resources");
            assert_eq!(exe_dir.parent(), resources.parent());
        }

        // HOME 下的默认 SDK 位置排在 ANDROID_HOME / ANDROID_SDK_ROOT 之后
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            assert!(config
                .sdk_roots
                .ends_with(&[home.join("Library/Android/sdk"), home.join("Android/Sdk")]));
        }
        if let Ok(sdk) = std::env::var("ANDROID_HOME") {
            assert_eq!(config.sdk_roots[0], PathBuf::from(sdk));
        }
    }
}
