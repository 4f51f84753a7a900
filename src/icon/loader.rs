//! # 加载与解码模块
//!
//! ## 设计思路
//!
//! 统一处理文件与内存两种来源的原始字节加载，并在“尽可能早”的阶段执行输入校验，
//! 尽快失败，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取
//! - 签名：`infer` 识别文件头；TGA 没有魔数，仅在扩展名提示为 TGA 时放行
//! - 解码：先读 header 尺寸按像素上限拒绝，再完整解码并转为 RGBA

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};

use super::source::RawImageData;
use super::{ConvertConfig, IconError, ImageSource, RasterImage};

/// 可导入的源文件扩展名。
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "tga"];

/// 加载并解码图片来源，输出 RGBA 光栅图像。
pub fn load_source(source: &ImageSource, config: &ConvertConfig) -> Result<RasterImage, IconError> {
    log::debug!("🔎 加载图片来源: {}", source.describe());
    let (raw, hint) = match source {
        ImageSource::FilePath(path) => (load_from_file(path, config)?, format_hint(path)),
        ImageSource::Memory { bytes, label } => (load_from_memory(bytes, label, config)?, None),
    };

    decode(raw, hint, config)
}

/// 按扩展名判断是否为支持的源文件（忽略大小写）。
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn load_from_file(path: &Path, config: &ConvertConfig) -> Result<RawImageData, IconError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    if !path.exists() {
        return Err(IconError::Io(format!("文件不存在：{}", path.display())));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| IconError::Io(format!("无法读取文件信息：{}", e)))?;

    if metadata.len() > config.max_file_size {
        return Err(IconError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes =
        std::fs::read(path).map_err(|e| IconError::Io(format!("无法读取图片文件：{}", e)))?;
    validate_image_signature(&bytes, format_hint(path))?;

    Ok(RawImageData {
        bytes,
        source_hint: "file",
    })
}

fn load_from_memory(
    bytes: &[u8],
    label: &str,
    config: &ConvertConfig,
) -> Result<RawImageData, IconError> {
    log::info!("📝 开始处理内存图片 - 标识: {}", label);

    if bytes.len() as u64 > config.max_file_size {
        return Err(IconError::ResourceLimit(format!(
            "图片数据过大：{:.2} MB（限制：{:.2} MB）",
            bytes.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }
    validate_image_signature(bytes, None)?;

    Ok(RawImageData {
        bytes: bytes.to_vec(),
        source_hint: "memory",
    })
}

fn format_hint(path: &Path) -> Option<ImageFormat> {
    ImageFormat::from_path(path).ok()
}

fn validate_image_signature(bytes: &[u8], hint: Option<ImageFormat>) -> Result<(), IconError> {
    if bytes.is_empty() {
        return Err(IconError::InvalidInput("图片内容为空".to_string()));
    }

    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() != infer::MatcherType::Image => {
            Err(IconError::InvalidInput(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )))
        }
        Some(_) => Ok(()),
        None if hint == Some(ImageFormat::Tga) => Ok(()),
        None => Err(IconError::InvalidInput("无法识别图片类型".to_string())),
    }
}

fn reader(
    bytes: &[u8],
    hint: Option<ImageFormat>,
) -> Result<ImageReader<Cursor<&[u8]>>, IconError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| IconError::Decode(format!("无法识别图片格式：{}", e)))?;

    if reader.format().is_none() {
        match hint {
            Some(format) => reader.set_format(format),
            None => return Err(IconError::InvalidInput("无法识别图片格式".to_string())),
        }
    }

    Ok(reader)
}

fn decode(
    raw: RawImageData,
    hint: Option<ImageFormat>,
    config: &ConvertConfig,
) -> Result<RasterImage, IconError> {
    let (header_width, header_height) = reader(&raw.bytes, hint)?
        .into_dimensions()
        .map_err(|e| IconError::Decode(format!("无法读取图片尺寸：{}", e)))?;
    validate_pixel_limits(config, header_width, header_height)?;

    let decoded = reader(&raw.bytes, hint)?
        .decode()
        .map_err(|e| IconError::Decode(format!("图片解码失败：{}", e)))?;

    let image = RasterImage::from_dynamic(decoded)?;
    validate_pixel_limits(config, image.width(), image.height())?;

    log::info!(
        "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
        raw.source_hint,
        image.width(),
        image.height()
    );

    Ok(image)
}

fn validate_pixel_limits(config: &ConvertConfig, width: u32, height: u32) -> Result<(), IconError> {
    let pixels = u64::from(width)
        .checked_mul(u64::from(height))
        .ok_or_else(|| IconError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(IconError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 200]));
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .expect("png should encode");
        buf.into_inner()
    }

    fn memory(bytes: Vec<u8>) -> ImageSource {
        ImageSource::Memory {
            bytes,
            label: "test".to_string(),
        }
    }

    #[test]
    fn memory_png_decodes_to_rgba() {
        let image = load_source(&memory(png_bytes(7, 5)), &ConvertConfig::default())
            .expect("png should load");
        assert_eq!(image.dimensions(), (7, 5));
        assert_eq!(image.as_rgba().get_pixel(3, 3), &Rgba([10, 20, 30, 200]));
    }

    #[test]
    fn empty_and_non_image_bytes_are_rejected() {
        let config = ConvertConfig::default();
        assert!(matches!(
            load_source(&memory(Vec::new()), &config),
            Err(IconError::InvalidInput(_))
        ));
        assert!(matches!(
            load_source(&memory(b"hello, not an image".to_vec()), &config),
            Err(IconError::InvalidInput(_))
        ));
        assert!(matches!(
            load_source(&memory(b"%PDF-1.7\n".to_vec()), &config),
            Err(IconError::InvalidInput(_))
        ));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let mut bytes = png_bytes(16, 16);
        bytes.truncate(40);
        assert!(matches!(
            load_source(&memory(bytes), &ConvertConfig::default()),
            Err(IconError::Decode(_))
        ));
    }

    #[test]
    fn pixel_limit_is_checked_before_decoding() {
        let config = ConvertConfig {
            max_decoded_pixels: 100,
            ..ConvertConfig::default()
        };
        assert!(matches!(
            load_source(&memory(png_bytes(11, 10)), &config),
            Err(IconError::ResourceLimit(_))
        ));
    }

    #[test]
    fn file_size_limit_is_enforced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.png");
        std::fs::write(&path, png_bytes(32, 32)).expect("write source");

        let config = ConvertConfig {
            max_file_size: 10,
            ..ConvertConfig::default()
        };
        assert!(matches!(
            load_source(&ImageSource::FilePath(path), &config),
            Err(IconError::ResourceLimit(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = ImageSource::FilePath(PathBuf::from("/definitely/not/here.png"));
        assert!(matches!(
            load_source(&source, &ConvertConfig::default()),
            Err(IconError::Io(_))
        ));
    }

    #[test]
    fn tga_is_loaded_by_extension_hint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sprite.tga");
        RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, ImageFormat::Tga)
            .expect("tga should encode");

        let image = load_source(&ImageSource::FilePath(path), &ConvertConfig::default())
            .expect("tga should load");
        assert_eq!(image.dimensions(), (4, 3));
    }

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported_extension(Path::new("a/b/logo.PNG")));
        assert!(is_supported_extension(Path::new("photo.jpeg")));
        assert!(is_supported_extension(Path::new("sprite.Tga")));
        assert!(!is_supported_extension(Path::new("icon.ico")));
        assert!(!is_supported_extension(Path::new("README")));
    }
}
