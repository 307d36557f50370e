//! Device Bridge FFI - C ABI 导出层
//!
//! 提供给 DroidConnect 桌面壳（Swift / WebKit 消息通道）调用的 C 接口。
//!
//! 设计原则：
//! - 返回 JSON 字符串，Swift 端用 Codable 解析
//! - 参数无效返回 null / false
//! - 调用者负责通过 `dcb_free_string` 释放返回的字符串
//! - 同步接口会阻塞调用线程，主线程请使用 `_async` 版本

use device_bridge::{BridgeConfig, BridgeResponse, DeviceBridge};
use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// 异步结果回调
///
/// `json` 只在回调期间有效，`user_data` 原样传回
pub type DCBResultCallbackFn = extern "C" fn(json: *const c_char, user_data: *mut c_void);

/// FFI 安全的 Bridge 句柄
pub struct DCBridge {
    bridge: Arc<DeviceBridge>,
    runtime: Runtime,
}

/// 跨线程传递宿主的 user_data
struct UserData(*mut c_void);

// 宿主保证 user_data 在回调之前一直有效
unsafe impl Send for UserData {}

// ==================== 生命周期管理 ====================

/// 使用默认配置创建 Bridge
///
/// # 返回
/// - 成功：返回句柄指针
/// - 失败：返回 null
///
/// # Safety
/// 调用者负责通过 `dcb_destroy` 释放返回的指针
#[no_mangle]
pub extern "C" fn dcb_create() -> *mut DCBridge {
    create_with_config(BridgeConfig::default())
}

/// 创建 Bridge，并把 `bundle_dir` 作为优先查找的内置工具目录
///
/// # 参数
/// - `bundle_dir`: app bundle 中存放 adb / scrcpy 的目录，null 等同于 `dcb_create`
///
/// # Safety
/// - `bundle_dir` 如果非 null，必须是有效的 UTF-8 C 字符串
/// - 调用者负责通过 `dcb_destroy` 释放返回的指针
#[no_mangle]
pub unsafe extern "C" fn dcb_create_with_bundle_dir(bundle_dir: *const c_char) -> *mut DCBridge {
    if bundle_dir.is_null() {
        return dcb_create();
    }

    let dir = match CStr::from_ptr(bundle_dir).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    create_with_config(BridgeConfig::default().with_bundle_dir(dir))
}

/// 释放 Bridge
///
/// 已启动的投屏进程不受影响
///
/// # Safety
/// - `handle` 必须是 `dcb_create*` 返回的有效指针
/// - 只能调用一次
#[no_mangle]
pub unsafe extern "C" fn dcb_destroy(handle: *mut DCBridge) {
    if !handle.is_null() {
        let _ = Box::from_raw(handle);
    }
}

// ==================== 设备操作 ====================

/// 列举 ready 设备（阻塞）
///
/// # 返回
/// - 成功：JSON 字符串数组，如 `["emulator-5554"]`；找不到 adb 时为 `[]`
/// - 句柄无效：null
///
/// # Safety
/// - `handle` 必须是有效指针
/// - 调用者负责通过 `dcb_free_string` 释放返回的字符串
#[no_mangle]
pub unsafe extern "C" fn dcb_list_devices(handle: *mut DCBridge) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }

    let handle = &*handle;
    let devices = handle.runtime.block_on(handle.bridge.list_devices());
    json_to_cstring(&devices)
}

/// 列举 ready 设备（非阻塞）
///
/// 在后台执行，完成后以 `BridgeResponse` JSON 调用 `callback`。
/// 返回 false 表示参数无效，callback 不会被调用。
///
/// # Safety
/// - `handle` 必须是有效指针，并且在 callback 返回前不能被释放
/// - `user_data` 在 callback 返回前必须有效
#[no_mangle]
pub unsafe extern "C" fn dcb_list_devices_async(
    handle: *mut DCBridge,
    callback: Option<DCBResultCallbackFn>,
    user_data: *mut c_void,
) -> bool {
    if handle.is_null() {
        return false;
    }
    let Some(callback) = callback else {
        return false;
    };

    let handle = &*handle;
    let bridge = handle.bridge.clone();
    let user_data = UserData(user_data);

    handle.runtime.spawn(async move {
        let response = BridgeResponse::Devices {
            devices: bridge.list_devices().await,
        };
        deliver(callback, &response.to_json(), user_data);
    });
    true
}

/// 为指定设备启动投屏
///
/// # 返回
/// - true：scrcpy 已启动（不代表投屏窗口已建立）
/// - false：参数无效、找不到 scrcpy 或启动失败（详情见日志）
///
/// # Safety
/// - `handle` 必须是有效指针
/// - `device_id` 必须是有效的 UTF-8 C 字符串
#[no_mangle]
pub unsafe extern "C" fn dcb_start_mirroring(
    handle: *mut DCBridge,
    device_id: *const c_char,
) -> bool {
    if handle.is_null() || device_id.is_null() {
        return false;
    }

    let handle = &*handle;
    let device_id = match CStr::from_ptr(device_id).to_str() {
        Ok(s) => s,
        Err(_) => return false,
    };

    handle
        .runtime
        .block_on(handle.bridge.start_mirroring(device_id))
        .is_ok()
}

// ==================== 消息通道 ====================

/// 处理 Web 页面发来的消息（阻塞）
///
/// # 返回
/// - `BridgeResponse` JSON，未知消息返回 `status: "error"`
/// - 参数无效：null
///
/// # Safety
/// - `handle` 必须是有效指针
/// - `message` 必须是有效的 UTF-8 C 字符串
/// - 调用者负责通过 `dcb_free_string` 释放返回的字符串
#[no_mangle]
pub unsafe extern "C" fn dcb_handle_message(
    handle: *mut DCBridge,
    message: *const c_char,
) -> *mut c_char {
    if handle.is_null() || message.is_null() {
        return ptr::null_mut();
    }

    let handle = &*handle;
    let message = match CStr::from_ptr(message).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let response = handle.runtime.block_on(handle.bridge.handle_message(message));
    string_to_cstring(&response.to_json())
}

/// 处理 Web 页面发来的消息（非阻塞）
///
/// # Safety
/// - `handle` 必须是有效指针，并且在 callback 返回前不能被释放
/// - `message` 必须是有效的 UTF-8 C 字符串，函数返回后即可释放
/// - `user_data` 在 callback 返回前必须有效
#[no_mangle]
pub unsafe extern "C" fn dcb_handle_message_async(
    handle: *mut DCBridge,
    message: *const c_char,
    callback: Option<DCBResultCallbackFn>,
    user_data: *mut c_void,
) -> bool {
    if handle.is_null() || message.is_null() {
        return false;
    }
    let Some(callback) = callback else {
        return false;
    };

    let handle = &*handle;
    let message = match CStr::from_ptr(message).to_str() {
        Ok(s) => s.to_string(),
        Err(_) => return false,
    };
    let bridge = handle.bridge.clone();
    let user_data = UserData(user_data);

    handle.runtime.spawn(async move {
        let response = bridge.handle_message(&message).await;
        deliver(callback, &response.to_json(), user_data);
    });
    true
}

// ==================== 内存管理 ====================

/// 释放由本库返回的字符串
///
/// # Safety
/// - `s` 必须是本库函数返回的字符串指针
/// - 只能调用一次
#[no_mangle]
pub unsafe extern "C" fn dcb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

// ==================== 版本信息 ====================

/// 获取库版本号
///
/// # 返回
/// - 返回静态版本字符串，不需要释放
#[no_mangle]
pub extern "C" fn dcb_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// ==================== 内部辅助函数 ====================

fn create_with_config(config: BridgeConfig) -> *mut DCBridge {
    let runtime = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {:?}", e);
            return ptr::null_mut();
        }
    };

    let handle = Box::new(DCBridge {
        bridge: Arc::new(DeviceBridge::new(config)),
        runtime,
    });
    Box::into_raw(handle)
}

fn deliver(callback: DCBResultCallbackFn, json: &str, user_data: UserData) {
    let c_json = CString::new(json).unwrap_or_default();
    callback(c_json.as_ptr(), user_data.0);
}

fn json_to_cstring<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstring(&json),
        Err(_) => ptr::null_mut(),
    }
}

fn string_to_cstring(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}
