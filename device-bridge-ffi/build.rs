//! 生成 include/device_bridge_ffi.h

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let out_dir = crate_dir.join("include");
    std::fs::create_dir_all(&out_dir).ok();

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")).unwrap_or_default();

    // 头文件生成失败不阻断 Rust 侧编译，宿主工程会发现头文件缺失
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("device_bridge_ffi.h"));
        }
        Err(e) => {
            println!("cargo:warning=device_bridge_ffi.h not generated: {}", e);
        }
    }
}
