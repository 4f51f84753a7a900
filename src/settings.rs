//! 设置文件加载
//!
//! JSON 设置文件同时描述转换配置与默认转换请求，缺省字段回落到默认值：
//!
//! ```json
//! {
//!   "config": { "quality": "quality", "png_compression": "best" },
//!   "request": { "sizes": [16, 32, 48], "bit_depth": 32, "corner_radius": 8 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::icon::{ConversionRequest, ConvertConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub config: ConvertConfig,
    pub request: ConversionRequest,
}

/// 读取设置文件；文件不存在时使用默认设置。
pub fn load_settings(path: &Path) -> Result<Settings, AppError> {
    if !path.exists() {
        log::warn!("⚠️ 设置文件不存在，使用默认设置 - 路径: {}", path.display());
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)?;
    let settings = serde_json::from_str::<Settings>(&content)
        .map_err(|e| AppError::Config(format!("解析设置文件失败: {}", e)))?;

    log::info!("⚙️ 已加载设置文件 - 路径: {}", path.display());
    Ok(settings)
}
