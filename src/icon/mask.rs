//! # 圆角蒙版模块
//!
//! ## 设计思路
//!
//! 按尺寸绘制单通道圆角矩形蒙版，再用蒙版**替换**源图的 Alpha 通道。
//! 源图原有透明度被丢弃，颜色通道保持不变。
//!
//! ## 实现思路
//!
//! 1. 半径按 `min(radius, w / 2, h / 2)` 钳制（整数向下取整），避免小图出现“蝴蝶结”形状
//! 2. 四个角的圆心取连续坐标下的内缩点 `(r, r)`（及其镜像），按像素中心 `(x + 0.5, y + 0.5)` 判定；
//!    坐标统一乘 2 后用整数比较，不引入浮点误差
//! 3. 逐像素写回 Alpha

use image::{GrayImage, Luma};

use super::RasterImage;

const OPAQUE: u8 = 255;
const TRANSPARENT: u8 = 0;

/// 为图像应用圆角，`radius == 0` 时原样返回。
///
/// # 示例
/// ```rust
/// use iconforge::icon::{apply_rounded_corners, RasterImage};
///
/// let image = RasterImage::from_rgba(8, 8, vec![255; 8 * 8 * 4])?;
/// let rounded = apply_rounded_corners(image, 4);
/// assert_eq!(rounded.as_rgba().get_pixel(0, 0)[3], 0);
/// assert_eq!(rounded.as_rgba().get_pixel(4, 4)[3], 255);
/// # Ok::<(), iconforge::icon::IconError>(())
/// ```
pub fn apply_rounded_corners(image: RasterImage, radius: u32) -> RasterImage {
    if radius == 0 {
        return image;
    }

    let (width, height) = image.dimensions();
    let mask = rounded_rect_mask(width, height, radius);
    let mut pixels = image.into_inner();

    for (pixel, coverage) in pixels.pixels_mut().zip(mask.pixels()) {
        pixel[3] = coverage[0];
    }

    log::debug!(
        "🔘 圆角蒙版已应用 - 尺寸: {}x{} 请求半径: {} 实际半径: {}",
        width,
        height,
        radius,
        clamp_radius(width, height, radius)
    );

    RasterImage::from_valid(pixels)
}

/// 生成圆角矩形蒙版：内部 255，角外 0。
pub fn rounded_rect_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width, height, Luma([OPAQUE]));
    let r = i64::from(clamp_radius(width, height, radius));
    if r == 0 {
        return mask;
    }

    let w = i64::from(width);
    let h = i64::from(height);
    // 以下均为 2 倍坐标：像素中心 2x + 1，圆心 2r / 2(w - r)
    let limit = 4 * r * r;

    for y in 0..h {
        let in_top = y < r;
        let in_bottom = y >= h - r;
        if !in_top && !in_bottom {
            continue;
        }
        let cy = if in_top { 2 * r } else { 2 * (h - r) };
        let dy = 2 * y + 1 - cy;

        for x in 0..w {
            let in_left = x < r;
            let in_right = x >= w - r;
            if !in_left && !in_right {
                continue;
            }
            let cx = if in_left { 2 * r } else { 2 * (w - r) };
            let dx = 2 * x + 1 - cx;

            if dx * dx + dy * dy > limit {
                mask.put_pixel(x as u32, y as u32, Luma([TRANSPARENT]));
            }
        }
    }

    mask
}

/// 实际生效半径。
pub fn clamp_radius(width: u32, height: u32, radius: u32) -> u32 {
    radius.min(width / 2).min(height / 2)
}
