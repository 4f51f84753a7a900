//! # ICO 编码器
//!
//! ## 设计思路
//!
//! 编码器只做一件事：把一张源图按请求的尺寸逐个重采样、编码为条目数据，
//! 再拼装成完整的 ICO 字节流。编码器不写文件，输出全部缓冲在内存中，
//! 持久化由调用方负责。
//!
//! ## 实现思路
//!
//! 1. 8 位模式下先检查 256 尺寸，直接拒绝，不做任何缩放
//! 2. 按尺寸顺序缩放并编码：32 位写 PNG，8 位写调色板 BMP
//! 3. 偏移 = 6 + 16 * count + 之前所有条目数据长度之和
//! 4. 头、目录、数据依次拼接

use image::codecs::png::{self, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::directory::{self, ICONDIR_SIZE, ICONDIRENTRY_SIZE, IcoDirectoryEntry};
use super::{
    BitDepth, EncodeOptions, IconError, IconSizes, MAX_ICON_SIZE, PngCompression, RasterImage,
    bmp, resize,
};

/// 将源图编码为包含所有尺寸的 ICO 字节流。
///
/// # 示例
/// ```rust
/// use iconforge::icon::{encode_ico, BitDepth, EncodeOptions, IcoDirectory, IconSizes, RasterImage};
///
/// let source = RasterImage::from_rgba(64, 64, vec![200; 64 * 64 * 4])?;
/// let sizes = IconSizes::new([16, 32])?;
/// let bytes = encode_ico(&source, &sizes, BitDepth::ThirtyTwo, &EncodeOptions::default())?;
///
/// let directory = IcoDirectory::parse(&bytes)?;
/// assert_eq!(directory.len(), 2);
/// assert_eq!(directory.end_offset(), bytes.len() as u64);
/// # Ok::<(), iconforge::icon::IconError>(())
/// ```
pub fn encode_ico(
    source: &RasterImage,
    sizes: &IconSizes,
    bit_depth: BitDepth,
    options: &EncodeOptions,
) -> Result<Vec<u8>, IconError> {
    if bit_depth == BitDepth::Eight && sizes.contains(MAX_ICON_SIZE) {
        return Err(IconError::UnsupportedSizeForBitDepth {
            size: MAX_ICON_SIZE,
            bits: bit_depth.bits_per_pixel(),
        });
    }

    let count = u16::try_from(sizes.len())
        .map_err(|_| IconError::InvalidInput(format!("条目数量过多：{}", sizes.len())))?;

    let mut payloads: Vec<(u32, Vec<u8>)> = Vec::with_capacity(sizes.len());
    for size in sizes.iter() {
        let resized = resize::resample(source, size, options.quality)?;
        let payload = match bit_depth {
            BitDepth::ThirtyTwo => encode_png(&resized, options.png_compression)?,
            BitDepth::Eight => bmp::encode_palettized(&resized)?,
        };
        log::debug!(
            "🧩 条目编码完成 - 尺寸: {}x{} 色深: {} 字节: {}",
            size,
            size,
            bit_depth.bits_per_pixel(),
            payload.len()
        );
        payloads.push((size, payload));
    }

    let table_end = ICONDIR_SIZE + ICONDIRENTRY_SIZE * payloads.len();
    let total = table_end + payloads.iter().map(|(_, p)| p.len()).sum::<usize>();
    let total_u32 = u32::try_from(total)
        .map_err(|_| IconError::EncodeFailure(format!("ICO 数据超过 4GB：{} 字节", total)))?;

    let mut out = Vec::with_capacity(total);
    directory::write_header(&mut out, count);

    let mut offset = table_end as u32;
    for (size, payload) in &payloads {
        let entry = IcoDirectoryEntry {
            width: *size,
            height: *size,
            color_count: 0,
            planes: 1,
            bits_per_pixel: bit_depth.bits_per_pixel(),
            bytes_in_res: payload.len() as u32,
            image_offset: offset,
        };
        entry.write_to(&mut out);
        offset += entry.bytes_in_res;
    }
    debug_assert_eq!(out.len(), table_end);

    for (_, payload) in &payloads {
        out.extend_from_slice(payload);
    }
    debug_assert_eq!(offset, total_u32);
    debug_assert_eq!(out.len(), total);

    log::info!(
        "📦 ICO 编码完成 - 条目: {} 色深: {} 总字节: {}",
        count,
        bit_depth.bits_per_pixel(),
        out.len()
    );

    Ok(out)
}

/// 每个尺寸单独编码为只含一个条目的 ICO。
pub fn encode_ico_per_size(
    source: &RasterImage,
    sizes: &IconSizes,
    bit_depth: BitDepth,
    options: &EncodeOptions,
) -> Result<Vec<(u32, Vec<u8>)>, IconError> {
    if bit_depth == BitDepth::Eight && sizes.contains(MAX_ICON_SIZE) {
        return Err(IconError::UnsupportedSizeForBitDepth {
            size: MAX_ICON_SIZE,
            bits: bit_depth.bits_per_pixel(),
        });
    }

    sizes
        .iter()
        .map(|size| {
            let single = IconSizes::single(size)?;
            Ok((size, encode_ico(source, &single, bit_depth, options)?))
        })
        .collect()
}

/// 将 RGBA 图像编码为 PNG 字节。
pub fn encode_png(image: &RasterImage, compression: PngCompression) -> Result<Vec<u8>, IconError> {
    let (width, height) = image.dimensions();
    let mut buf = Vec::new();

    let encoder =
        PngEncoder::new_with_quality(&mut buf, compression.to_image(), png::FilterType::Adaptive);
    encoder
        .write_image(
            image.as_rgba().as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| IconError::EncodeFailure(format!("PNG 编码失败：{}", e)))?;

    Ok(buf)
}
