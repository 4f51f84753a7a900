//! # 缩放模块
//!
//! ## 设计思路
//!
//! 每个图标尺寸都要从源图重新采样，缩放质量直接决定小尺寸图标的观感。
//! 主路径使用 `fast_image_resize` 卷积缩放，失败时回退 `image::imageops::resize`，
//! 两条路径使用同一档位映射出的滤镜。

use fast_image_resize as fr;
use image::{ImageBuffer, Rgba};

use super::{IconError, RasterImage, ResizeQuality};

/// 将图像缩放为 `size x size` 的正方形。
pub fn resample(
    image: &RasterImage,
    size: u32,
    quality: ResizeQuality,
) -> Result<RasterImage, IconError> {
    resize_exact(image, size, size, quality)
}

/// 缩放到指定宽高；尺寸未变化时直接复制。
pub fn resize_exact(
    image: &RasterImage,
    target_width: u32,
    target_height: u32,
    quality: ResizeQuality,
) -> Result<RasterImage, IconError> {
    if target_width == 0 || target_height == 0 {
        return Err(IconError::InvalidInput(format!(
            "缩放目标尺寸必须为正数：{}x{}",
            target_width, target_height
        )));
    }

    if image.dimensions() == (target_width, target_height) {
        return Ok(image.clone());
    }

    match resize_with_fast_image_resize(image, target_width, target_height, quality) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!(
                "⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}",
                err
            );
            let resized = image::imageops::resize(
                image.as_rgba(),
                target_width,
                target_height,
                quality.image_filter(),
            );
            Ok(RasterImage::from_valid(resized))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &RasterImage,
    target_width: u32,
    target_height: u32,
    quality: ResizeQuality,
) -> Result<RasterImage, IconError> {
    let (src_width, src_height) = image.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        image.as_rgba().as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| IconError::EncodeFailure(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(quality.fast_filter()));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| IconError::EncodeFailure(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        target_width,
        target_height,
        dst_image.into_vec(),
    )
    .ok_or_else(|| IconError::EncodeFailure("fast_image_resize 输出缓冲长度异常".to_string()))?;

    RasterImage::new(rgba)
}
