//! # 8 位调色板 BMP 条目编码
//!
//! ## 设计思路
//!
//! 经典 BMP 条目没有原生 Alpha，透明度由紧随像素数据之后的 1 位 AND 掩码表达。
//! 条目布局：
//!
//! ```text
//! BITMAPINFOHEADER (40)  biHeight = 2 * height（XOR + AND）
//! 调色板 256 * BGRA0 (1024)
//! XOR 像素索引，自底向上，每行 4 字节对齐
//! AND 掩码，自底向上，每行 4 字节对齐，1 = 透明
//! ```
//!
//! ## 实现思路
//!
//! - 不透明像素的颜色数不超过 256 时直接建立精确调色板（无损、确定）。
//! - 超过 256 色时用 NeuQuant 量化到 256 色。
//! - `alpha < 128` 的像素写入 AND 掩码，并使用调色板索引 0。

use std::collections::HashMap;

use color_quant::NeuQuant;
use image::RgbaImage;

use super::{IconError, RasterImage};

/// AND 掩码阈值：Alpha 低于该值的像素视为透明。
pub const ALPHA_MASK_THRESHOLD: u8 = 128;

const BITMAPINFOHEADER_SIZE: u32 = 40;
const PALETTE_ENTRIES: usize = 256;
const BI_RGB: u32 = 0;
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// 将 RGBA 图像编码为 8 位调色板 BMP 条目（不含 BITMAPFILEHEADER）。
pub fn encode_palettized(image: &RasterImage) -> Result<Vec<u8>, IconError> {
    let (width, height) = image.dimensions();
    if width >= 256 || height >= 256 {
        return Err(IconError::UnsupportedSizeForBitDepth {
            size: width.max(height),
            bits: 8,
        });
    }

    let pixels = image.as_rgba();
    let palette = Palette::build(pixels);

    let xor_stride = row_stride(width, 8);
    let and_stride = row_stride(width, 1);
    let image_size = (xor_stride + and_stride) * height as usize;
    let total = BITMAPINFOHEADER_SIZE as usize + PALETTE_ENTRIES * 4 + image_size;

    let mut out = Vec::with_capacity(total);

    // BITMAPINFOHEADER
    out.extend_from_slice(&BITMAPINFOHEADER_SIZE.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&((height * 2) as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&(image_size as u32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&(PALETTE_ENTRIES as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    let colors = palette.colors();
    for slot in 0..PALETTE_ENTRIES {
        let [r, g, b] = colors.get(slot).copied().unwrap_or([0, 0, 0]);
        out.extend_from_slice(&[b, g, r, 0]);
    }

    for y in (0..height).rev() {
        let row_start = out.len();
        for x in 0..width {
            let pixel = pixels.get_pixel(x, y);
            let index = if pixel[3] < ALPHA_MASK_THRESHOLD {
                0
            } else {
                palette.index_of([pixel[0], pixel[1], pixel[2]])
            };
            out.push(index);
        }
        out.resize(row_start + xor_stride, 0);
    }

    for y in (0..height).rev() {
        let mut row = vec![0u8; and_stride];
        for x in 0..width {
            if pixels.get_pixel(x, y)[3] < ALPHA_MASK_THRESHOLD {
                row[(x / 8) as usize] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&row);
    }

    debug_assert_eq!(out.len(), total);
    log::debug!(
        "🎨 8 位 BMP 条目编码完成 - 尺寸: {}x{} 调色板: {} 字节: {}",
        width,
        height,
        palette.kind(),
        out.len()
    );

    Ok(out)
}

/// 每行字节数，按 32 位对齐。
fn row_stride(width: u32, bits_per_pixel: usize) -> usize {
    (width as usize * bits_per_pixel).div_ceil(32) * 4
}

enum Palette {
    Exact {
        colors: Vec<[u8; 3]>,
        lookup: HashMap<[u8; 3], u8>,
    },
    Quantized(NeuQuant),
}

impl Palette {
    fn build(pixels: &RgbaImage) -> Self {
        let mut colors: Vec<[u8; 3]> = Vec::new();
        let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();

        for pixel in pixels.pixels() {
            if pixel[3] < ALPHA_MASK_THRESHOLD {
                continue;
            }
            let rgb = [pixel[0], pixel[1], pixel[2]];
            if lookup.contains_key(&rgb) {
                continue;
            }
            if colors.len() == PALETTE_ENTRIES {
                return Self::quantize(pixels);
            }
            lookup.insert(rgb, colors.len() as u8);
            colors.push(rgb);
        }

        Self::Exact { colors, lookup }
    }

    fn quantize(pixels: &RgbaImage) -> Self {
        let samples: Vec<u8> = pixels
            .pixels()
            .filter(|pixel| pixel[3] >= ALPHA_MASK_THRESHOLD)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2], 255])
            .collect();

        Self::Quantized(NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, PALETTE_ENTRIES, &samples))
    }

    fn colors(&self) -> Vec<[u8; 3]> {
        match self {
            Self::Exact { colors, .. } => colors.clone(),
            Self::Quantized(quant) => quant
                .color_map_rgba()
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        }
    }

    fn index_of(&self, rgb: [u8; 3]) -> u8 {
        match self {
            Self::Exact { lookup, .. } => lookup.get(&rgb).copied().unwrap_or(0),
            Self::Quantized(quant) => quant.index_of(&[rgb[0], rgb[1], rgb[2], 255]) as u8,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Exact { .. } => "exact",
            Self::Quantized(_) => "neuquant",
        }
    }
}
