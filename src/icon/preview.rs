//! # 预览渲染
//!
//! 先在原始分辨率上应用圆角，再等比缩放进预览框；小图不放大。

use super::{IconError, RasterImage, ResizeQuality, mask, resize};

/// 生成圆角预览图，最长边不超过 `max_edge`。
pub fn render_preview(
    image: RasterImage,
    radius: u32,
    max_edge: u32,
    quality: ResizeQuality,
) -> Result<RasterImage, IconError> {
    if max_edge == 0 {
        return Err(IconError::InvalidInput("预览框边长必须为正数".to_string()));
    }

    let rounded = mask::apply_rounded_corners(image, radius);
    let (width, height) = rounded.dimensions();
    let (target_width, target_height) = fit_within(width, height, max_edge);

    if (target_width, target_height) == (width, height) {
        return Ok(rounded);
    }

    log::debug!(
        "🖼️ 预览缩放 - {}x{} → {}x{}",
        width,
        height,
        target_width,
        target_height
    );
    resize::resize_exact(&rounded, target_width, target_height, quality)
}

/// 等比缩放进 `max_edge x max_edge`，不放大，任一边至少 1 像素。
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }

    let scale = |side: u32| {
        let scaled = (u64::from(side) * u64::from(max_edge) + u64::from(longest) / 2) / u64::from(longest);
        (scaled as u32).max(1)
    };
    (scale(width), scale(height))
}
