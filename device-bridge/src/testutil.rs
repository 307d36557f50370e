//! 测试用的可执行脚本写入

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// 写入文件并设置权限
///
/// 写句柄在设置权限前同步并关闭，避免随后 exec 时遇到 ETXTBSY。
pub(crate) fn write_file(path: &Path, contents: &str, mode: u32) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    path.to_path_buf()
}

/// 在 `dir` 下安装一个 `/bin/sh` 脚本
pub(crate) fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    write_file(&dir.join(name), &format!("#!/bin/sh\n{}\n", body), 0o755)
}
