//! # IconForge — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 CLI (clap: convert / preview / inspect)  │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  ├─ settings ─── JSON 设置文件 → ConvertConfig + 请求     │
//! │  └─ icon ─────── 图标转换                                 │
//! │      ├─ loader     文件/内存加载·签名·解码                │
//! │      ├─ mask       圆角蒙版                               │
//! │      ├─ resize     fast_image_resize 缩放                 │
//! │      ├─ encoder    ICO 拼装（PNG / bmp 8 位条目）         │
//! │      ├─ directory  ICONDIR 读写                           │
//! │      ├─ writer     原子写入                               │
//! │      └─ converter  单文件 / 批量编排                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`icon`] | 圆角蒙版、ICO 编码、批量转换 |
//! | [`settings`] | 设置文件的读取与默认值回落 |

pub mod error;
pub mod icon;
pub mod settings;
