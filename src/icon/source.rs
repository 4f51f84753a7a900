//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“转换中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `RasterImage` 表示已规范化为 RGBA 的像素数据
//! - `ConversionRequest` 描述一次转换的全部选项

use std::path::PathBuf;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::IconError;

/// ICO 目录项可以描述的最大边长。
pub const MAX_ICON_SIZE: u32 = 256;

/// 默认尺寸组合。
pub const STANDARD_SIZES: [u32; 6] = [16, 32, 48, 64, 128, 256];

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// 内存字节来源，`label` 仅用于日志。
    Memory { bytes: Vec<u8>, label: String },
}

impl ImageSource {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::FilePath(path) => path.display().to_string(),
            Self::Memory { label, .. } => label.clone(),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 8 位 RGBA 光栅图像，宽高恒为正数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// 包装现有 RGBA 缓冲，拒绝零尺寸图像。
    pub fn new(pixels: RgbaImage) -> Result<Self, IconError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(IconError::InvalidInput(format!(
                "图像尺寸必须为正数：{}x{}",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    /// 从原始 RGBA 字节构建（`width * height * 4`）。
    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, IconError> {
        let pixels = RgbaImage::from_raw(width, height, bytes).ok_or_else(|| {
            IconError::InvalidInput(format!("RGBA 缓冲长度与尺寸 {}x{} 不匹配", width, height))
        })?;
        Self::new(pixels)
    }

    /// 将任意解码结果规范化为 RGBA。
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, IconError> {
        Self::new(image.into_rgba8())
    }

    /// 内部变换已保证尺寸合法时使用。
    pub(crate) fn from_valid(pixels: RgbaImage) -> Self {
        debug_assert!(pixels.width() > 0 && pixels.height() > 0);
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_inner(self) -> RgbaImage {
        self.pixels
    }
}

/// 条目色深模式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    /// 32 位带透明通道，条目内嵌 PNG。
    #[default]
    ThirtyTwo,
    /// 8 位调色板，条目为 BMP + AND 掩码。
    Eight,
}

impl BitDepth {
    pub fn bits_per_pixel(self) -> u16 {
        match self {
            Self::ThirtyTwo => 32,
            Self::Eight => 8,
        }
    }

    /// 解析 `32` / `32-bit` / `8` / `8-bit`（忽略大小写）。
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Result<Self, IconError> {
        let normalized = value.trim().to_lowercase();
        match normalized.trim_end_matches("-bit").trim_end_matches("bit") {
            "32" => Ok(Self::ThirtyTwo),
            "8" => Ok(Self::Eight),
            _ => Err(IconError::InvalidInput(format!(
                "未知色深：{}（可选：32 / 8）",
                value
            ))),
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = IconError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(Self::ThirtyTwo),
            8 => Ok(Self::Eight),
            other => Err(IconError::InvalidInput(format!("未知色深：{}", other))),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits_per_pixel()
    }
}

/// 去重后的目标尺寸列表，保持首次出现的顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct IconSizes(Vec<u32>);

impl IconSizes {
    pub fn new(sizes: impl IntoIterator<Item = u32>) -> Result<Self, IconError> {
        let mut ordered: Vec<u32> = Vec::new();
        for size in sizes {
            if size == 0 || size > MAX_ICON_SIZE {
                return Err(IconError::InvalidInput(format!(
                    "图标尺寸必须在 1~{} 之间：{}",
                    MAX_ICON_SIZE, size
                )));
            }
            if !ordered.contains(&size) {
                ordered.push(size);
            }
        }

        if ordered.is_empty() {
            return Err(IconError::InvalidInput("至少需要选择一个图标尺寸".to_string()));
        }

        Ok(Self(ordered))
    }

    pub fn standard() -> Self {
        Self(STANDARD_SIZES.to_vec())
    }

    pub(crate) fn single(size: u32) -> Result<Self, IconError> {
        Self::new([size])
    }

    /// 移除指定尺寸；移除后为空时返回错误。
    pub fn without(&self, size: u32) -> Result<Self, IconError> {
        Self::new(self.0.iter().copied().filter(|&s| s != size))
    }

    pub fn contains(&self, size: u32) -> bool {
        self.0.contains(&size)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for IconSizes {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<u32>> for IconSizes {
    type Error = IconError;

    fn try_from(sizes: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(sizes)
    }
}

impl From<IconSizes> for Vec<u32> {
    fn from(sizes: IconSizes) -> Self {
        sizes.0
    }
}

/// 输出分组方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// 所有尺寸合并为 `<name>.ico`。
    #[default]
    Combined,
    /// 每个尺寸单独输出 `<name>_<size>.ico`。
    PerSize,
}

/// 单次转换的完整选项。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionRequest {
    pub sizes: IconSizes,
    pub bit_depth: BitDepth,
    /// 圆角半径，0 表示不处理。
    pub corner_radius: u32,
    pub output_mode: OutputMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_dedupe_keeps_first_occurrence_order() {
        let sizes = IconSizes::new([48, 16, 48, 32, 16]).expect("valid sizes");
        assert_eq!(sizes.as_slice(), &[48, 16, 32]);
    }

    #[test]
    fn sizes_reject_empty_and_out_of_range() {
        assert!(matches!(IconSizes::new(Vec::<u32>::new()), Err(IconError::InvalidInput(_))));
        assert!(matches!(IconSizes::new([0]), Err(IconError::InvalidInput(_))));
        assert!(matches!(IconSizes::new([16, 257]), Err(IconError::InvalidInput(_))));
    }

    #[test]
    fn sizes_without_last_entry_is_an_error() {
        let sizes = IconSizes::new([256]).expect("valid sizes");
        assert!(matches!(sizes.without(256), Err(IconError::InvalidInput(_))));

        let standard = IconSizes::standard().without(256).expect("other sizes remain");
        assert!(!standard.contains(256));
        assert_eq!(standard.len(), 5);
    }

    #[test]
    fn bit_depth_parses_common_spellings() {
        assert_eq!(BitDepth::from_str("32").expect("32"), BitDepth::ThirtyTwo);
        assert_eq!(BitDepth::from_str("8-bit").expect("8-bit"), BitDepth::Eight);
        assert_eq!(BitDepth::from_str("32BIT").expect("32BIT"), BitDepth::ThirtyTwo);
        assert!(matches!(BitDepth::from_str("24"), Err(IconError::InvalidInput(_))));
    }

    #[test]
    fn raster_image_rejects_zero_dimensions() {
        assert!(matches!(
            RasterImage::new(RgbaImage::new(0, 4)),
            Err(IconError::InvalidInput(_))
        ));
        assert!(matches!(
            RasterImage::from_rgba(2, 2, vec![0; 3]),
            Err(IconError::InvalidInput(_))
        ));
    }

    #[test]
    fn request_deserializes_from_json() {
        let request: ConversionRequest = serde_json::from_str(
            r#"{ "sizes": [32, 16, 32], "bit_depth": 8, "corner_radius": 6, "output_mode": "per_size" }"#,
        )
        .expect("request json should parse");

        assert_eq!(request.sizes.as_slice(), &[32, 16]);
        assert_eq!(request.bit_depth, BitDepth::Eight);
        assert_eq!(request.corner_radius, 6);
        assert_eq!(request.output_mode, OutputMode::PerSize);
    }

    #[test]
    fn request_rejects_invalid_sizes_in_json() {
        let result = serde_json::from_str::<ConversionRequest>(r#"{ "sizes": [] }"#);
        assert!(result.is_err());
    }
}
