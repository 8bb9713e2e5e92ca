//! # 图标生成模块（icon_builder）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码 → 槽位回退 → 逐尺寸缩放编码 → 容器组装 → 产物输出”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线（配置快照 + 阶段耗时日志）
//! - `loader`：负责文件/Base64/内存字节加载与签名校验
//! - `pipeline`：负责解码、像素限制、方形缩放与 PNG 编码
//! - `resolver`：槽位回退规则（纯函数）
//! - `container`：ICO 容器的字节级编码与独立解析
//! - `emitter`：产物包装（文件名、媒体类型、落盘）
//! - `preview`：逐尺寸预览
//! - `config/error/source`：配置、错误、数据模型
//!
//! ## 调用链
//!
//! ```text
//! UploadMode / SizeSlots<ImageSource>
//!    ↓
//! handler.rs（配置快照、至少一个槽位非空）
//!    ├─ loader.rs + pipeline.rs（每个不同来源解码一次）
//!    ├─ resolver.rs（六个尺寸全部落到具体源图）
//!    ├─ pipeline.rs（spawn_blocking 并发缩放 + PNG 编码）
//!    ├─ container.rs（头部 + 目录 + 载荷）
//!    └─ emitter.rs（icon.ico / image/x-icon）
//! ```

mod config;
mod container;
mod emitter;
mod error;
mod handler;
mod loader;
mod pipeline;
mod preview;
mod resolver;
mod source;

#[cfg(test)]
mod test_support;

pub use config::{DEFAULT_OUTPUT_FILE_NAME, IcoAdvancedConfig, IcoConfig, IcoPerformanceProfile};
pub use container::{
    ContainerEntry, ContainerFile, DIRECTORY_ENTRY_LEN, HEADER_LEN, IconDirectoryEntry,
    encode_container, read_container,
};
pub use emitter::{ICO_MEDIA_TYPE, IcoArtifact};
pub use error::IcoError;
pub use handler::IconHandler;
pub use preview::SizePreview;
pub use resolver::{ResolvedPlan, resolve_slots};
pub use source::{EncodedImage, IconSize, ImageSource, SizeSlots, SourceImage, UploadMode};
