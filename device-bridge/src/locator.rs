//! 外部工具定位
//!
//! 按固定顺序检查候选路径，返回第一个存在且可执行的文件：
//! 1. 显式覆盖路径
//! 2. 应用内置目录（含 `Resources/Binaries`、`Binaries` 子目录）
//! 3. 系统安装目录
//! 4. Android SDK（仅 adb）
//! 5. PATH
//!
//! 找不到不是错误，返回 None 由调用方处理。

use crate::config::BridgeConfig;
use crate::types::{Tool, ToolPath};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 内置目录下依次尝试的子目录
const BUNDLE_SUBDIRS: &[&str] = &["", "Resources/Binaries", "Binaries"];

/// 工具定位器
#[derive(Debug, Clone)]
pub struct ToolLocator {
    overrides: HashMap<Tool, PathBuf>,
    bundle_dirs: Vec<PathBuf>,
    system_dirs: Vec<PathBuf>,
    sdk_roots: Vec<PathBuf>,
    search_path: bool,
}

impl ToolLocator {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            overrides: config.tool_overrides.clone(),
            bundle_dirs: config.bundle_dirs.clone(),
            system_dirs: config.system_dirs.clone(),
            sdk_roots: config.sdk_roots.clone(),
            search_path: config.search_path,
        }
    }

    /// 按查找顺序列出候选路径（已去重）
    pub fn candidates(&self, tool: Tool) -> Vec<PathBuf> {
        let binary = tool.binary_name();
        let mut candidates = Vec::new();

        if let Some(path) = self.overrides.get(&tool) {
            candidates.push(path.clone());
        }

        for dir in &self.bundle_dirs {
            for sub in BUNDLE_SUBDIRS {
                let base = if sub.is_empty() { dir.clone() } else { dir.join(sub) };
                candidates.push(base.join(&binary));
            }
        }

        for dir in &self.system_dirs {
            candidates.push(dir.join(&binary));
        }

        if tool == Tool::DeviceLister {
            for root in &self.sdk_roots {
                candidates.push(root.join("platform-tools").join(&binary));
            }
        }

        if self.search_path {
            if let Ok(path) = which::which(&binary) {
                candidates.push(path);
            }
        }

        let mut seen = Vec::with_capacity(candidates.len());
        candidates.retain(|path| {
            if seen.contains(path) {
                false
            } else {
                seen.push(path.clone());
                true
            }
        });
        candidates
    }

    /// 查找工具，返回第一个可执行的候选
    pub fn locate(&self, tool: Tool) -> Option<ToolPath> {
        for candidate in self.candidates(tool) {
            if is_executable(&candidate) {
                debug!("[Locator] {} resolved to {}", tool, candidate.display());
                return Some(ToolPath {
                    tool,
                    path: absolutize(candidate),
                });
            }
            debug!("[Locator] {} not usable at {}", tool, candidate.display());
        }
        None
    }
}

/// 存在、是普通文件，且（Unix 下）有执行权限
pub fn is_executable(path: &Path) -> bool {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return false,
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_tool(dir: &Path, name: &str, mode: u32) -> PathBuf {
        crate::testutil::write_file(&dir.join(name), "#!/bin/sh\nexit 0\n", mode)
    }

    #[test]
    fn test_missing_tool_is_none() {
        let dir = TempDir::new().unwrap();
        let locator = ToolLocator::from_config(&BridgeConfig::isolated(dir.path()));
        assert!(locator.locate(Tool::DeviceLister).is_none());
        assert!(locator.locate(Tool::MirrorLauncher).is_none());
    }

    #[test]
    fn test_candidate_order() {
        let mut config = BridgeConfig::isolated("/bundle")
            .with_tool_override(Tool::DeviceLister, "/custom/adb");
        config.system_dirs = vec![PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")];
        config.sdk_roots = vec![PathBuf::from("/sdk")];

        let locator = ToolLocator::from_config(&config);
        let binary = Tool::DeviceLister.binary_name();
        let candidates = locator.candidates(Tool::DeviceLister);

        assert_eq!(candidates[0], PathBuf::from("/custom/adb"));
        assert_eq!(candidates[1], PathBuf::from("/bundle").join(&binary));
        assert_eq!(
            candidates[2],
            PathBuf::from("/bundle/Resources/Binaries").join(&binary)
        );
        assert_eq!(candidates[3], PathBuf::from("/bundle/Binaries").join(&binary));
        assert_eq!(candidates[4], PathBuf::from("/usr/local/bin").join(&binary));
        assert_eq!(candidates[5], PathBuf::from("/usr/bin").join(&binary));
        assert_eq!(
            candidates[6],
            PathBuf::from("/sdk/platform-tools").join(&binary)
        );
        assert_eq!(candidates.len(), 7);

        // SDK 目录只用于 adb
        let mirror = locator.candidates(Tool::MirrorLauncher);
        assert!(!mirror.iter().any(|p| p.starts_with("/sdk")));
    }

    #[test]
    fn test_candidates_deduplicated() {
        let mut config = BridgeConfig::isolated("/usr/bin");
        config.system_dirs = vec![PathBuf::from("/usr/bin")];
        let locator = ToolLocator::from_config(&config);
        let candidates = locator.candidates(Tool::MirrorLauncher);
        let unique: std::collections::HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_finds_bundled_binaries_subdir() {
        let dir = TempDir::new().unwrap();
        let expected = write_tool(&dir.path().join("Resources/Binaries"), "scrcpy", 0o755);

        let locator = ToolLocator::from_config(&BridgeConfig::isolated(dir.path()));
        let found = locator.locate(Tool::MirrorLauncher).unwrap();
        assert_eq!(found.tool, Tool::MirrorLauncher);
        assert_eq!(found.path, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_non_executable() {
        let dir = TempDir::new().unwrap();
        write_tool(dir.path(), "adb", 0o644);
        let fallback = write_tool(&dir.path().join("Binaries"), "adb", 0o755);

        let locator = ToolLocator::from_config(&BridgeConfig::isolated(dir.path()));
        assert_eq!(locator.locate(Tool::DeviceLister).unwrap().path, fallback);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_not_executable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("adb")).unwrap();
        assert!(!is_executable(&dir.path().join("adb")));

        let locator = ToolLocator::from_config(&BridgeConfig::isolated(dir.path()));
        assert!(locator.locate(Tool::DeviceLister).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_override_wins_over_bundle() {
        let dir = TempDir::new().unwrap();
        write_tool(dir.path(), "adb", 0o755);
        let custom = write_tool(&dir.path().join("custom"), "my-adb", 0o755);

        let config =
            BridgeConfig::isolated(dir.path()).with_tool_override(Tool::DeviceLister, &custom);
        let locator = ToolLocator::from_config(&config);
        assert_eq!(locator.locate(Tool::DeviceLister).unwrap().path, custom);
    }
}
