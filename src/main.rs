//! # IconForge — 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与结果输出。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use iconforge::error::AppError;
use iconforge::icon::{
    self, BitDepth, ConversionRequest, IcoDirectory, IconConverter, IconSizes, OutputMode,
    PngCompression, ResizeQuality,
};
use iconforge::settings::{self, Settings};

#[derive(Parser)]
#[command(name = "iconforge")]
#[command(version, about = "将图片转换为 Windows ICO 图标")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 批量转换图片为 .ico
    Convert(ConvertArgs),
    /// 生成圆角预览 PNG
    Preview {
        input: PathBuf,
        /// 输出 PNG 路径
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        radius: u32,
        /// 预览框边长
        #[arg(long)]
        edge: Option<u32>,
        #[arg(long, value_parser = parse_quality)]
        quality: Option<ResizeQuality>,
    },
    /// 打印 .ico 文件的目录信息
    Inspect { file: PathBuf },
}

#[derive(Args)]
struct ConvertArgs {
    /// 源图片或目录（目录中的受支持图片都会被转换）
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// 输出目录
    #[arg(short, long)]
    out_dir: PathBuf,
    /// 图标尺寸，逗号分隔，例如 16,32,48
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<u32>>,
    /// 色深：32 或 8
    #[arg(long, value_parser = parse_bits)]
    bits: Option<BitDepth>,
    /// 圆角半径（像素），0 表示不处理
    #[arg(long)]
    radius: Option<u32>,
    /// 每个尺寸单独输出为 <name>_<size>.ico
    #[arg(long)]
    separate: bool,
    /// 缩放档位：quality / balanced / speed
    #[arg(long, value_parser = parse_quality)]
    quality: Option<ResizeQuality>,
    /// JSON 设置文件
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn parse_bits(value: &str) -> Result<BitDepth, String> {
    BitDepth::from_str(value).map_err(|e| e.to_string())
}

fn parse_quality(value: &str) -> Result<ResizeQuality, String> {
    ResizeQuality::from_str(value).map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Preview {
            input,
            output,
            radius,
            edge,
            quality,
        } => run_preview(&input, &output, radius, edge, quality),
        Commands::Inspect { file } => run_inspect(&file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("错误: {}", e);
            process::exit(1);
        }
    }
}

/// 设置文件打底，命令行参数覆盖。
fn resolve_settings(args: &ConvertArgs) -> Result<Settings, AppError> {
    let mut loaded = match &args.settings {
        Some(path) => settings::load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(sizes) = &args.sizes {
        loaded.request.sizes = IconSizes::new(sizes.iter().copied())?;
    }
    if let Some(bits) = args.bits {
        loaded.request.bit_depth = bits;
    }
    if let Some(radius) = args.radius {
        loaded.request.corner_radius = radius;
    }
    if args.separate {
        loaded.request.output_mode = OutputMode::PerSize;
    }
    if let Some(quality) = args.quality {
        loaded.config.quality = quality;
    }
    Ok(loaded)
}

/// 返回 `Ok(false)` 表示存在转换失败的文件。
fn run_convert(args: ConvertArgs) -> Result<bool, AppError> {
    let sources = expand_inputs(&args.inputs)?;
    if sources.is_empty() {
        return Err(AppError::Config("没有找到可转换的图片".to_string()));
    }

    let Settings { config, request } = resolve_settings(&args)?;
    log_request(&request);

    let converter = IconConverter::new(config);
    let report = converter.convert_batch(&sources, &request, &args.out_dir);

    for output in report.outputs() {
        println!("已生成 {}", output.display());
    }
    for (source, error) in report.failures() {
        eprintln!("失败 {} [{}] {}", source.display(), error.code(), error);
    }
    println!("完成：成功 {} 个，失败 {} 个", report.succeeded(), report.failed());

    Ok(report.failed() == 0)
}

fn run_preview(
    input: &Path,
    output: &Path,
    radius: u32,
    edge: Option<u32>,
    quality: Option<ResizeQuality>,
) -> Result<bool, AppError> {
    let mut config = icon::ConvertConfig::default();
    if let Some(edge) = edge {
        config.preview_edge = edge;
    }
    if let Some(quality) = quality {
        config.quality = quality;
    }

    let converter = IconConverter::new(config);
    let preview = converter.preview_file(input, radius)?;
    let png = icon::encode_png(&preview, PngCompression::Default)?;
    icon::write_atomic(output, &png)?;

    println!(
        "已生成预览 {}（{}x{}）",
        output.display(),
        preview.width(),
        preview.height()
    );
    Ok(true)
}

fn run_inspect(file: &Path) -> Result<bool, AppError> {
    let bytes = std::fs::read(file)?;
    let directory = IcoDirectory::parse(&bytes)?;

    println!("{}: {} 个条目，{} 字节", file.display(), directory.len(), bytes.len());
    for (index, entry) in directory.entries().iter().enumerate() {
        let kind = match directory.payload(&bytes, index) {
            Some(payload) if payload.starts_with(b"\x89PNG") => "png",
            Some(_) => "bmp",
            None => "?",
        };
        println!(
            "  #{} {}x{} {}bpp {} offset={} size={}",
            index,
            entry.width,
            entry.height,
            entry.bits_per_pixel,
            kind,
            entry.image_offset,
            entry.bytes_in_res
        );
    }
    Ok(true)
}

/// 展开目录参数为其中受支持的图片（按文件名排序）。
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && icon::is_supported_extension(path))
                .collect();
            found.sort();
            log::info!("📂 目录 {} 中找到 {} 张图片", input.display(), found.len());
            sources.extend(found);
        } else {
            sources.push(input.clone());
        }
    }
    Ok(sources)
}

fn log_request(request: &ConversionRequest) {
    log::info!(
        "🛠️ 转换参数 - 尺寸: {:?} 色深: {} 圆角: {} 输出: {:?}",
        request.sizes.as_slice(),
        request.bit_depth.bits_per_pixel(),
        request.corner_radius,
        request.output_mode
    );
}
