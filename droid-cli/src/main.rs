//! DroidConnect CLI - Device Bridge 命令行入口

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use device_bridge::{BridgeConfig, DeviceBridge, DeviceRecord, Tool};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// DroidConnect Device Bridge CLI
#[derive(Parser, Debug)]
#[command(name = "droidconnect")]
#[command(version, about = "List attached Android devices and launch scrcpy mirroring")]
struct Args {
    /// Log level or filter directive (e.g. `debug`, `device_bridge=trace`)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Extra directory searched first for bundled adb / scrcpy
    #[arg(long, global = true)]
    bundle_dir: Option<PathBuf>,

    /// Explicit adb path
    #[arg(long, global = true)]
    adb: Option<PathBuf>,

    /// Explicit scrcpy path
    #[arg(long, global = true)]
    scrcpy: Option<PathBuf>,

    /// Max seconds to wait for adb
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Do not look up tools on PATH
    #[arg(long, default_value = "false", global = true)]
    no_path_search: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List devices that are connected and authorized
    Devices {
        /// Show product / model / transport details
        #[arg(short = 'L', long)]
        long: bool,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Start a detached scrcpy session for a device
    Mirror {
        /// Device serial as reported by `droidconnect devices`
        serial: String,
    },

    /// Dispatch a raw UI message and print the JSON response
    Request {
        /// e.g. `list_devices` or `{"action":"startMirroring","deviceId":"X"}`
        message: String,
    },
}

impl Args {
    fn bridge_config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        if let Some(dir) = &self.bundle_dir {
            config = config.with_bundle_dir(dir);
        }
        if let Some(adb) = &self.adb {
            config = config.with_tool_override(Tool::DeviceLister, adb);
        }
        if let Some(scrcpy) = &self.scrcpy {
            config = config.with_tool_override(Tool::MirrorLauncher, scrcpy);
        }
        if let Some(secs) = self.timeout_secs.filter(|s| *s > 0) {
            config = config.with_capture_timeout(Duration::from_secs(secs));
        }
        if self.no_path_search {
            config.search_path = false;
        }
        config
    }
}

fn format_record(record: &DeviceRecord) -> String {
    let mut line = record.serial.clone();
    for (key, value) in [
        ("product", &record.product),
        ("model", &record.model),
        ("device", &record.device),
        ("transport_id", &record.transport_id),
    ] {
        if let Some(value) = value {
            line.push_str(&format!(" {}:{}", key, value));
        }
    }
    line
}

/// 无法解析的过滤表达式回退到 warn
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志（输出到 stderr，stdout 只留给结果）
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&args.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.bridge_config();
    debug!("Bridge config: {:?}", config);
    let bridge = DeviceBridge::new(config);

    match args.command {
        Command::Devices { long, json } => {
            let records = bridge
                .list_device_records()
                .await
                .context("failed to list devices")?;

            if json {
                if long {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else {
                    let serials: Vec<&str> = records.iter().map(|r| r.serial.as_str()).collect();
                    println!("{}", serde_json::to_string(&serials)?);
                }
            } else {
                for record in &records {
                    if long {
                        println!("{}", format_record(record));
                    } else {
                        println!("{}", record.serial);
                    }
                }
            }
        }
        Command::Mirror { serial } => {
            let pid = bridge
                .start_mirroring(&serial)
                .await
                .with_context(|| format!("failed to start mirroring {}", serial))?;
            println!("scrcpy started for {} (pid {})", serial, pid);
        }
        Command::Request { message } => {
            let response = bridge.handle_message(&message).await;
            println!("{}", response.to_json());
            if response.is_error() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
