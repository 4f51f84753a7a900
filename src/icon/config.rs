//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ConvertConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中缩放质量档位（quality / balanced / speed）作为高层语义，映射到底层滤镜。
//!
//! ## 实现思路
//!
//! - `Default` 提供默认限制（单文件 4MB、预览框 256）。
//! - `ResizeQuality` 负责档位字符串解析与反向输出。
//! - 三个档位都属于卷积类滤镜，图标缩放不使用最近邻。
//! - 配置可从 JSON 设置文件反序列化，缺省字段回落到默认值。

use fast_image_resize as fr;
use image::codecs::png::CompressionType;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::IconError;

/// 默认单文件体积上限。
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// 预览框边长。
pub const DEFAULT_PREVIEW_EDGE: u32 = 256;

/// 图标转换配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// 读取源文件时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 缩放质量档位。
    pub quality: ResizeQuality,
    /// 32 位条目内嵌 PNG 的压缩等级。
    pub png_compression: PngCompression,
    /// 预览图最长边。
    pub preview_edge: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_decoded_pixels: 40_000_000,
            quality: ResizeQuality::Balanced,
            png_compression: PngCompression::Default,
            preview_edge: DEFAULT_PREVIEW_EDGE,
        }
    }
}

impl ConvertConfig {
    /// 提取编码阶段需要的参数。
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            quality: self.quality,
            png_compression: self.png_compression,
        }
    }
}

/// 编码器参数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub quality: ResizeQuality,
    pub png_compression: PngCompression,
}

/// 缩放质量档位（面向用户语义）。
///
/// - `Quality`：Lanczos3，尽量保真
/// - `Balanced`：CatmullRom，质量与速度平衡
/// - `Speed`：双线性，优先速度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeQuality {
    Quality,
    #[default]
    Balanced,
    Speed,
}

impl ResizeQuality {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use iconforge::icon::ResizeQuality;
    ///
    /// let q = ResizeQuality::from_str("Quality")?;
    /// assert_eq!(q.as_str(), "quality");
    /// # Ok::<(), iconforge::icon::IconError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, IconError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(IconError::InvalidInput(format!(
                "未知缩放档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    pub(crate) fn image_filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::Lanczos3,
            Self::Balanced => FilterType::CatmullRom,
            Self::Speed => FilterType::Triangle,
        }
    }

    pub(crate) fn fast_filter(self) -> fr::FilterType {
        match self {
            Self::Quality => fr::FilterType::Lanczos3,
            Self::Balanced => fr::FilterType::CatmullRom,
            Self::Speed => fr::FilterType::Bilinear,
        }
    }
}

/// PNG 压缩等级。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl PngCompression {
    pub(crate) fn to_image(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Default => CompressionType::Default,
            Self::Best => CompressionType::Best,
        }
    }
}
