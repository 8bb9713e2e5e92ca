//! # icon-forge — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │        外部协作方（上传界面 / 命令行 / 其他调用方）          │
//! │   单图 · 双图 · 六槽位手动  ──→  SizeSlots<ImageSource>     │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<IcoArtifact, IcoError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  ├─ commands ─── 命令行参数适配（薄封装）                   │
//! │  └─ icon_builder                                         │
//! │      ├─ loader / pipeline   加载 · 解码 · 缩放 · PNG      │
//! │      ├─ resolver            槽位回退规则                  │
//! │      ├─ container           ICO 字节级编码 / 解析          │
//! │      └─ emitter             icon.ico / image/x-icon      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`commands`] | `build` / `preview` / `inspect` 命令的参数解析与执行 |
//! | [`icon_builder`] | 从 1/2/6 个槽位生成 16~256 六尺寸的 `.ico` |

pub mod commands;
pub mod error;
pub mod icon_builder;
