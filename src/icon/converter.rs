//! # 转换编排模块
//!
//! ## 设计思路
//!
//! `IconConverter` 只负责流程编排与配置管理，处理链路固定为：
//! 1. 读取配置快照
//! 2. 加载并解码源图
//! 3. 应用圆角（半径 > 0 时）
//! 4. 按输出方式编码全部 ICO
//! 5. 全部编码成功后再逐个原子写入
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ConvertConfig>>` 支持运行时切换缩放档位。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/encode/write/total` 阶段耗时，便于性能诊断。
//! - 批量转换逐个文件独立处理，单个失败只记录，不中断整批。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{
    BitDepth, ConversionRequest, ConvertConfig, IconError, IconSizes, ImageSource, MAX_ICON_SIZE,
    OutputMode, RasterImage, ResizeQuality, encoder, loader, mask, preview, writer,
};

/// 一份编码完成、尚未落盘的 ICO。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedIcon {
    /// 单尺寸输出时的尺寸；合并输出为 `None`。
    pub size: Option<u32>,
    pub bytes: Vec<u8>,
}

/// 批量转换中单个源文件的结果。
#[derive(Debug)]
pub enum FileOutcome {
    Converted { source: PathBuf, outputs: Vec<PathBuf> },
    Failed { source: PathBuf, error: IconError },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            Self::Converted { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// 批量转换报告，按输入顺序记录每个文件的结果。
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &IconError)> + '_ {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Failed { source, error } => Some((source.as_path(), error)),
            FileOutcome::Converted { .. } => None,
        })
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> + '_ {
        self.outcomes.iter().flat_map(|outcome| match outcome {
            FileOutcome::Converted { outputs, .. } => outputs.as_slice(),
            FileOutcome::Failed { .. } => &[][..],
        })
    }
}

/// 图标转换器。
pub struct IconConverter {
    config: Arc<RwLock<ConvertConfig>>,
}

impl IconConverter {
    /// 根据初始配置创建转换器。
    ///
    /// # 示例
    /// ```rust
    /// use iconforge::icon::{ConvertConfig, IconConverter, ResizeQuality};
    ///
    /// let converter = IconConverter::new(ConvertConfig::default());
    /// converter.set_quality(ResizeQuality::Quality)?;
    /// assert_eq!(converter.quality()?, ResizeQuality::Quality);
    /// # Ok::<(), iconforge::icon::IconError>(())
    /// ```
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照，保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ConvertConfig, IconError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| IconError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 切换缩放档位。
    pub fn set_quality(&self, quality: ResizeQuality) -> Result<(), IconError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| IconError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.quality = quality;

        log::info!("⚙️ 已切换缩放档位：{}", quality.as_str());
        Ok(())
    }

    /// 获取当前生效档位。
    pub fn quality(&self) -> Result<ResizeQuality, IconError> {
        let config = self
            .config
            .read()
            .map_err(|_| IconError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.quality)
    }

    /// 内存中完成圆角与编码，不做任何 I/O。
    pub fn convert_image(
        &self,
        image: RasterImage,
        request: &ConversionRequest,
    ) -> Result<Vec<EncodedIcon>, IconError> {
        let config = self.config_snapshot()?;
        encode_request(image, request, &config)
    }

    /// 转换单个文件，返回写出的全部路径。
    pub fn convert_file(
        &self,
        path: &Path,
        request: &ConversionRequest,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, IconError> {
        let config = self.config_snapshot()?;
        let stem = file_stem(path)?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let image = loader::load_source(&ImageSource::FilePath(path.to_path_buf()), &config)?;
        let load_elapsed = load_start.elapsed();

        let encode_start = Instant::now();
        let icons = encode_request(image, request, &config)?;
        let encode_elapsed = encode_start.elapsed();

        let write_start = Instant::now();
        let outputs = write_all(&icons, out_dir, &stem)?;
        let write_elapsed = write_start.elapsed();

        log::info!(
            "✅ 图标转换完成 - 源: {} 输出: {} 个 load={}ms encode={}ms write={}ms total={}ms",
            path.display(),
            outputs.len(),
            load_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            write_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(outputs)
    }

    /// 批量转换：重复路径只处理一次，单个失败不影响其余文件。
    pub fn convert_batch(
        &self,
        paths: &[PathBuf],
        request: &ConversionRequest,
        out_dir: &Path,
    ) -> BatchReport {
        let mut seen = HashSet::new();
        let mut report = BatchReport::default();

        for path in paths {
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                log::debug!("⏭️ 跳过重复源文件: {}", path.display());
                continue;
            }

            let outcome = match self.convert_file(path, request, out_dir) {
                Ok(outputs) => FileOutcome::Converted {
                    source: path.clone(),
                    outputs,
                },
                Err(error) => {
                    log::error!(
                        "❌ 转换失败 - 源: {} 阶段: {} 错误码: {} 详情: {}",
                        path.display(),
                        error.stage(),
                        error.code(),
                        error
                    );
                    FileOutcome::Failed {
                        source: path.clone(),
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        log::info!(
            "📊 批量转换结束 - 成功: {} 失败: {}",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// 加载源文件并渲染圆角预览图。
    pub fn preview_file(&self, path: &Path, radius: u32) -> Result<RasterImage, IconError> {
        let config = self.config_snapshot()?;
        let image = loader::load_source(&ImageSource::FilePath(path.to_path_buf()), &config)?;
        preview::render_preview(image, radius, config.preview_edge, config.quality)
    }
}

/// 8 位模式下移除 256 尺寸；移除后为空则报错。
pub fn prepare_sizes(request: &ConversionRequest) -> Result<IconSizes, IconError> {
    if request.bit_depth == BitDepth::Eight && request.sizes.contains(MAX_ICON_SIZE) {
        log::warn!("⚠️ 8 位色深不支持 256x256，已从尺寸列表中移除");
        return request.sizes.without(MAX_ICON_SIZE);
    }
    Ok(request.sizes.clone())
}

fn encode_request(
    image: RasterImage,
    request: &ConversionRequest,
    config: &ConvertConfig,
) -> Result<Vec<EncodedIcon>, IconError> {
    let sizes = prepare_sizes(request)?;
    let options = config.encode_options();
    let image = mask::apply_rounded_corners(image, request.corner_radius);

    match request.output_mode {
        OutputMode::Combined => {
            let bytes = encoder::encode_ico(&image, &sizes, request.bit_depth, &options)?;
            Ok(vec![EncodedIcon { size: None, bytes }])
        }
        OutputMode::PerSize => Ok(encoder::encode_ico_per_size(
            &image,
            &sizes,
            request.bit_depth,
            &options,
        )?
        .into_iter()
        .map(|(size, bytes)| EncodedIcon {
            size: Some(size),
            bytes,
        })
        .collect()),
    }
}

/// 逐个写入；任一失败时回滚本次已写出的文件：新建的删除，被覆盖的恢复旧内容。
fn write_all(icons: &[EncodedIcon], out_dir: &Path, stem: &str) -> Result<Vec<PathBuf>, IconError> {
    let mut written: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(icons.len());

    for icon in icons {
        let path = writer::output_path(out_dir, stem, icon.size);
        let result = read_existing(&path).and_then(|previous| {
            writer::write_atomic(&path, &icon.bytes)?;
            Ok(previous)
        });

        match result {
            Ok(previous) => written.push((path, previous)),
            Err(err) => {
                rollback(&written);
                return Err(err);
            }
        }
    }

    Ok(written.into_iter().map(|(path, _)| path).collect())
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, IconError> {
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read(path)
        .map(Some)
        .map_err(|e| IconError::Io(format!("无法读取已有输出 {}：{}", path.display(), e)))
}

fn rollback(written: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in written {
        let result = match previous {
            Some(bytes) => writer::write_atomic(path, bytes),
            None => std::fs::remove_file(path)
                .map_err(|e| IconError::Io(format!("无法删除 {}：{}", path.display(), e))),
        };
        if let Err(e) = result {
            log::warn!("⚠️ 回滚输出失败 - 路径: {} 错误: {}", path.display(), e);
        }
    }
}

fn file_stem(path: &Path) -> Result<String, IconError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| IconError::InvalidInput(format!("无法从路径提取文件名：{}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::IcoDirectory;
    use image::{Rgba, RgbaImage};

    fn source_image() -> RasterImage {
        RasterImage::new(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, 77, 255])
        }))
        .expect("source image")
    }

    fn request(sizes: &[u32], bit_depth: BitDepth, output_mode: OutputMode) -> ConversionRequest {
        ConversionRequest {
            sizes: IconSizes::new(sizes.iter().copied()).expect("sizes"),
            bit_depth,
            corner_radius: 0,
            output_mode,
        }
    }

    #[test]
    fn prepare_sizes_drops_256_for_eight_bit() {
        let sizes = prepare_sizes(&request(&[16, 256, 32], BitDepth::Eight, OutputMode::Combined))
            .expect("sizes remain");
        assert_eq!(sizes.as_slice(), &[16, 32]);

        let sizes = prepare_sizes(&request(&[16, 256], BitDepth::ThirtyTwo, OutputMode::Combined))
            .expect("32-bit keeps 256");
        assert_eq!(sizes.as_slice(), &[16, 256]);
    }

    #[test]
    fn prepare_sizes_fails_when_only_256_requested_in_eight_bit() {
        assert!(matches!(
            prepare_sizes(&request(&[256], BitDepth::Eight, OutputMode::Combined)),
            Err(IconError::InvalidInput(_))
        ));
    }

    #[test]
    fn combined_mode_yields_one_icon() {
        let converter = IconConverter::new(ConvertConfig::default());
        let icons = converter
            .convert_image(source_image(), &request(&[16, 32], BitDepth::ThirtyTwo, OutputMode::Combined))
            .expect("convert should succeed");

        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].size, None);
        let directory = IcoDirectory::parse(&icons[0].bytes).expect("valid ico");
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn per_size_mode_yields_one_icon_per_size() {
        let converter = IconConverter::new(ConvertConfig::default());
        let icons = converter
            .convert_image(source_image(), &request(&[48, 16], BitDepth::Eight, OutputMode::PerSize))
            .expect("convert should succeed");

        let sizes: Vec<Option<u32>> = icons.iter().map(|icon| icon.size).collect();
        assert_eq!(sizes, vec![Some(48), Some(16)]);
    }

    #[test]
    fn corner_radius_cuts_corners_of_entries() {
        let converter = IconConverter::new(ConvertConfig::default());
        let mut req = request(&[32], BitDepth::ThirtyTwo, OutputMode::Combined);
        req.corner_radius = 32;

        let icons = converter.convert_image(source_image(), &req).expect("convert should succeed");
        let directory = IcoDirectory::parse(&icons[0].bytes).expect("valid ico");
        let payload = directory.payload(&icons[0].bytes, 0).expect("payload");
        let decoded = image::load_from_memory(payload).expect("png payload").into_rgba8();

        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert!(decoded.get_pixel(16, 16)[3] > 250);
    }

    #[test]
    fn quality_switch_is_visible_in_snapshot() {
        let converter = IconConverter::new(ConvertConfig::default());
        assert_eq!(converter.quality().expect("read quality"), ResizeQuality::Balanced);

        converter.set_quality(ResizeQuality::Speed).expect("switch quality");
        assert_eq!(
            converter.config_snapshot().expect("snapshot").quality,
            ResizeQuality::Speed
        );
    }

    #[test]
    fn file_stem_rejects_pathless_input() {
        assert_eq!(file_stem(Path::new("dir/logo.png")).expect("stem"), "logo");
        assert!(matches!(file_stem(Path::new("/")), Err(IconError::InvalidInput(_))));
    }

    fn write_source(dir: &Path) -> PathBuf {
        let path = dir.join("app.png");
        source_image()
            .as_rgba()
            .save_with_format(&path, image::ImageFormat::Png)
            .expect("fixture png should be written");
        path
    }

    fn blocked_output(out_dir: &Path, name: &str) {
        // 目标位置是非空目录，rename 必然失败
        let blocker = out_dir.join(name);
        std::fs::create_dir_all(&blocker).expect("create blocker dir");
        std::fs::write(blocker.join("keep"), b"x").expect("populate blocker dir");
    }

    #[test]
    fn failed_write_restores_previously_existing_output() {
        let input = tempfile::tempdir().expect("input dir");
        let output = tempfile::tempdir().expect("output dir");
        let source = write_source(input.path());

        let earlier = output.path().join("app_16.ico");
        std::fs::write(&earlier, b"icon from an earlier run").expect("seed earlier output");
        blocked_output(output.path(), "app_32.ico");

        let converter = IconConverter::new(ConvertConfig::default());
        let result = converter.convert_file(
            &source,
            &request(&[16, 32], BitDepth::ThirtyTwo, OutputMode::PerSize),
            output.path(),
        );

        assert!(matches!(result, Err(IconError::Io(_))));
        assert_eq!(
            std::fs::read(&earlier).expect("earlier output survives"),
            b"icon from an earlier run"
        );
        assert!(!output.path().join("app_16.ico.tmp").exists());
        assert!(!output.path().join("app_32.ico.tmp").exists());
    }

    #[test]
    fn failed_write_removes_newly_created_output() {
        let input = tempfile::tempdir().expect("input dir");
        let output = tempfile::tempdir().expect("output dir");
        let source = write_source(input.path());
        blocked_output(output.path(), "app_32.ico");

        let converter = IconConverter::new(ConvertConfig::default());
        let result = converter.convert_file(
            &source,
            &request(&[16, 32], BitDepth::ThirtyTwo, OutputMode::PerSize),
            output.path(),
        );

        assert!(matches!(result, Err(IconError::Io(_))));
        assert!(!output.path().join("app_16.ico").exists());
    }

    #[test]
    fn batch_report_counts_outcomes() {
        let report = BatchReport {
            outcomes: vec![
                FileOutcome::Converted {
                    source: PathBuf::from("a.png"),
                    outputs: vec![PathBuf::from("a.ico")],
                },
                FileOutcome::Failed {
                    source: PathBuf::from("b.png"),
                    error: IconError::Decode("broken".to_string()),
                },
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outputs().count(), 1);
        let failures: Vec<&Path> = report.failures().map(|(path, _)| path).collect();
        assert_eq!(failures, vec![Path::new("b.png")]);
    }
}
