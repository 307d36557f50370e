//! 外部进程执行
//!
//! 两种模式：
//! - 同步捕获：等待退出，stdout + stderr 合并为一段文本
//! - 分离启动：不等待、不捕获，子进程生命周期与调用方无关
//!
//! 两者都需要在 tokio runtime 内调用。

use crate::error::{BridgeError, Result};
use crate::types::CapturedOutput;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 4096;

/// ETXTBSY：目标文件仍被某个进程以写方式打开
const TEXT_FILE_BUSY: i32 = 26;
const SPAWN_ATTEMPTS: u32 = 5;
const SPAWN_BACKOFF: Duration = Duration::from_millis(20);

/// 执行并捕获合并输出
///
/// 任意退出码都视为完成；只有启动失败、读取失败或超时才返回错误。
/// 超时后子进程会被杀掉。
pub async fn run_captured(path: &Path, args: &[String], timeout: Duration) -> Result<CapturedOutput> {
    debug!("[Runner] Capturing {} {:?}", path.display(), args);

    let mut cmd = Command::new(path);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = spawn(&mut cmd).await.map_err(|source| BridgeError::Launch {
        path: path.to_path_buf(),
        args: args.to_vec(),
        source,
    })?;

    let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
        (Some(out), Some(err)) => (out, err),
        _ => {
            return Err(BridgeError::Capture {
                path: path.to_path_buf(),
                source: std::io::Error::other("child pipes were not created"),
            })
        }
    };

    let work = async {
        let bytes = drain_merged(stdout, stderr).await?;
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((bytes, status))
    };
    let outcome = tokio::time::timeout(timeout, work).await;

    match outcome {
        Ok(Ok((bytes, status))) => {
            debug!(
                "[Runner] {} exited with {:?}, {} bytes captured",
                path.display(),
                status.code(),
                bytes.len()
            );
            Ok(CapturedOutput {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                exit_code: status.code(),
            })
        }
        Ok(Err(source)) => Err(BridgeError::Capture {
            path: path.to_path_buf(),
            source,
        }),
        Err(_) => {
            warn!(
                "[Runner] {} {:?} exceeded {:?}, killing",
                path.display(),
                args,
                timeout
            );
            if let Err(e) = child.kill().await {
                warn!("[Runner] Failed to kill {}: {}", path.display(), e);
            }
            Err(BridgeError::TimedOut {
                path: path.to_path_buf(),
                timeout,
            })
        }
    }
}

/// 分离启动，返回子进程 pid
///
/// 成功只代表系统接受了启动请求，不代表进程之后仍在运行。
pub fn run_detached(path: &Path, args: &[String]) -> Result<u32> {
    let mut cmd = Command::new(path);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach_child(&mut cmd);

    let child = spawn_blocking(&mut cmd).map_err(|source| BridgeError::Launch {
        path: path.to_path_buf(),
        args: args.to_vec(),
        source,
    })?;

    // 不设置 kill_on_drop，丢弃句柄后进程继续运行，由 runtime 负责回收
    let pid = child.id().unwrap_or_default();
    info!("[Runner] Launched {} {:?} (pid {})", path.display(), args, pid);
    Ok(pid)
}

/// 启动子进程，遇到 ETXTBSY 时退避重试
///
/// 刚写完的可执行文件可能仍有写句柄未关闭（例如被并发 fork 的进程继承），
/// 此时 exec 会短暂失败。
async fn spawn(cmd: &mut Command) -> std::io::Result<Child> {
    let mut attempt = 1;
    loop {
        match cmd.spawn() {
            Err(e) => match retry_delay(&e, attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return Err(e),
            },
            ok => return ok,
        }
        attempt += 1;
    }
}

/// 同 [`spawn`]，用于同步调用路径
fn spawn_blocking(cmd: &mut Command) -> std::io::Result<Child> {
    let mut attempt = 1;
    loop {
        match cmd.spawn() {
            Err(e) => match retry_delay(&e, attempt) {
                Some(delay) => std::thread::sleep(delay),
                None => return Err(e),
            },
            ok => return ok,
        }
        attempt += 1;
    }
}

fn retry_delay(err: &std::io::Error, attempt: u32) -> Option<Duration> {
    if !is_text_file_busy(err) || attempt >= SPAWN_ATTEMPTS {
        return None;
    }
    debug!("[Runner] Executable busy, retrying (attempt {})", attempt);
    Some(SPAWN_BACKOFF * attempt)
}

fn is_text_file_busy(err: &std::io::Error) -> bool {
    cfg!(unix) && err.raw_os_error() == Some(TEXT_FILE_BUSY)
}

/// 同时读取两个管道，按到达顺序写入同一个缓冲区
async fn drain_merged<O, E>(mut stdout: O, mut stderr: E) -> std::io::Result<Vec<u8>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut merged = Vec::new();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            n = stdout.read(&mut out_buf), if out_open => {
                match n? {
                    0 => out_open = false,
                    n => merged.extend_from_slice(&out_buf[..n]),
                }
            }
            n = stderr.read(&mut err_buf), if err_open => {
                match n? {
                    0 => err_open = false,
                    n => merged.extend_from_slice(&err_buf[..n]),
                }
            }
        }
    }

    Ok(merged)
}

/// 让子进程脱离父进程的进程组
#[cfg(unix)]
fn detach_child(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_child(cmd: &mut Command) {
    // CREATE_NEW_PROCESS_GROUP (0x200) | DETACHED_PROCESS (0x08)
    cmd.creation_flags(0x0000_0208);
}

#[cfg(not(any(unix, windows)))]
fn detach_child(_cmd: &mut Command) {}
