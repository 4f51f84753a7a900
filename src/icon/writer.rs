//! # 输出写入模块
//!
//! 先写同目录下的 `<name>.tmp` 临时文件，再 `rename` 覆盖目标文件，
//! 保证目标路径上只会出现完整的 ICO。

use std::fs;
use std::path::{Path, PathBuf};

use super::IconError;

const TEMP_SUFFIX: &str = "tmp";

/// 原子写入：失败时清理临时文件，不留下半成品。
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IconError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| IconError::Io(format!("无法创建输出目录 {}：{}", parent.display(), e)))?;
        }
    }

    let temp_path = temp_path_for(path);
    let result = fs::write(&temp_path, bytes).and_then(|_| fs::rename(&temp_path, path));

    if let Err(e) = result {
        if temp_path.exists() {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                log::warn!(
                    "⚠️ 临时文件清理失败 - 路径: {} 错误: {}",
                    temp_path.display(),
                    cleanup
                );
            }
        }
        return Err(IconError::Io(format!("写入 {} 失败：{}", path.display(), e)));
    }

    log::debug!("💾 已写入 {} 字节 - 路径: {}", bytes.len(), path.display());
    Ok(())
}

/// 计算输出文件路径：合并输出为 `<stem>.ico`，单尺寸输出为 `<stem>_<size>.ico`。
pub fn output_path(out_dir: &Path, stem: &str, size: Option<u32>) -> PathBuf {
    match size {
        None => out_dir.join(format!("{}.ico", stem)),
        Some(size) => out_dir.join(format!("{}_{}.ico", stem, size)),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}
