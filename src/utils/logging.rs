//! 日志初始化
//!
//! 按 [`LogConfig`] 启动 flexi_logger：按大小轮转，异步写入。
//! 启动后保留句柄，`shutdown` 时把缓冲中的记录写出。

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use parking_lot::{const_mutex, Mutex};

use crate::config::LogConfig;

static HANDLE: Mutex<Option<LoggerHandle>> = const_mutex(None);

/// 启动日志
///
/// 日志级别字符串无法解析或日志目录不可写时返回错误。
///
/// ```no_run
/// use tablectx::config::LogConfig;
/// use tablectx::utils::logging;
///
/// logging::init(&LogConfig::default()).expect("日志初始化失败");
/// ```
pub fn init(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_spec = FileSpec::default()
        .directory(&config.dir)
        .basename(&config.file);
    let rotation = Criterion::Size(config.max_file_size);
    let cleanup = Cleanup::KeepLogFiles(config.max_files);

    let handle = Logger::try_with_str(&config.level)?
        .log_to_file(file_spec)
        .rotate(rotation, Naming::Numbers, cleanup)
        .write_mode(WriteMode::Async)
        .append()
        .start()?;

    *HANDLE.lock() = Some(handle);
    log::info!("日志输出到 {}/{}", config.dir, config.file);
    Ok(())
}

/// 写出缓冲中的日志并停止
pub fn shutdown() {
    // 句柄析构时会等待异步写线程退出
    if let Some(handle) = HANDLE.lock().take() {
        handle.flush();
    }
}

pub fn is_initialized() -> bool {
    HANDLE.lock().is_some()
}
