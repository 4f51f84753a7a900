//! # 图标转换模块（icon）
//!
//! ## 设计思路
//!
//! 该模块将“源图加载 → 圆角蒙版 → 多尺寸重采样 → ICO 编码 → 原子写入”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `converter`：编排整条处理流水线与批量转换
//! - `loader`：负责文件/内存加载、签名校验与解码
//! - `mask`：圆角蒙版
//! - `resize`：高质量缩放
//! - `encoder`：ICO 容器拼装，`bmp` 负责 8 位条目
//! - `directory`：ICONDIR / ICONDIRENTRY 读写
//! - `writer`：临时文件 + rename 的原子写入
//! - `preview`：圆角预览图
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! main.rs（CLI 参数 → ConversionRequest）
//!    ↓
//! converter.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（体积/签名/像素上限 + 解码）
//!    ├─ mask.rs（radius > 0 时替换 Alpha）
//!    ├─ encoder.rs（resize.rs 缩放 → PNG / bmp.rs → 目录 + 数据）
//!    └─ writer.rs（全部编码成功后再落盘）
//!    ↓
//! BatchReport / AppError
//! ```
//!
//! ## 分层职责建议
//!
//! - 配置与策略变更优先改 `config.rs`
//! - ICO 字节布局相关问题优先看 `encoder.rs` 与 `directory.rs`
//! - 业务流程顺序变更优先改 `converter.rs`

mod bmp;
mod config;
mod converter;
mod directory;
mod encoder;
mod error;
mod loader;
mod mask;
mod preview;
mod resize;
mod source;
mod writer;

pub use bmp::{ALPHA_MASK_THRESHOLD, encode_palettized};
pub use config::{
    ConvertConfig, DEFAULT_MAX_FILE_SIZE, DEFAULT_PREVIEW_EDGE, EncodeOptions, PngCompression,
    ResizeQuality,
};
pub use converter::{BatchReport, EncodedIcon, FileOutcome, IconConverter, prepare_sizes};
pub use directory::{
    ICONDIR_SIZE, ICONDIRENTRY_SIZE, IcoDirectory, IcoDirectoryEntry, RESOURCE_TYPE_ICON,
};
pub use encoder::{encode_ico, encode_ico_per_size, encode_png};
pub use error::IconError;
pub use loader::{SUPPORTED_EXTENSIONS, is_supported_extension, load_source};
pub use mask::{apply_rounded_corners, clamp_radius, rounded_rect_mask};
pub use preview::{fit_within, render_preview};
pub use resize::{resample, resize_exact};
pub use source::{
    BitDepth, ConversionRequest, IconSizes, ImageSource, MAX_ICON_SIZE, OutputMode, RasterImage,
    STANDARD_SIZES,
};
pub use writer::{output_path, write_atomic};
