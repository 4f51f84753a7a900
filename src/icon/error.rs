//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图标转换链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` / `stage()` 提供稳定的机器可读标识，批量转换报告按文件输出时使用。

/// 图标转换统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("参数错误：{0}")]
    InvalidInput(String),

    #[error("尺寸 {size}x{size} 不支持 {bits} 位色深（256x256 仅支持 32 位 PNG 条目）")]
    UnsupportedSizeForBitDepth { size: u32, bits: u16 },

    #[error("编码错误：{0}")]
    EncodeFailure(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("文件错误：{0}")]
    Io(String),
}

impl IconError {
    /// 稳定错误码，供日志与批量报告使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "E_INVALID_INPUT",
            Self::UnsupportedSizeForBitDepth { .. } => "E_UNSUPPORTED_SIZE",
            Self::EncodeFailure(_) => "E_ENCODE",
            Self::Decode(_) => "E_DECODE",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Io(_) => "E_IO",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedSizeForBitDepth { .. } => "input",
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::EncodeFailure(_) => "encode",
            Self::Io(_) => "io",
        }
    }
}
