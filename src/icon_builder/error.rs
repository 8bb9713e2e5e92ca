//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图标生成链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 所有错误都是“整单失败”：任何阶段出错都不会产出半成品 `.ico`。

/// 图标生成统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum IcoError {
    #[error("未提供任何源图片，请至少上传一张图片")]
    NoSourceProvided,

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("缩放错误：{0}")]
    Resample(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("图标容器损坏：{0}")]
    InvalidContainer(String),
}

impl IcoError {
    /// 出错所在阶段，用于“哪一步失败”的提示。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NoSourceProvided => "validate",
            Self::FileSystem(_) | Self::InvalidFormat(_) => "load",
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::Resample(_) => "resample",
            Self::Encode(_) => "encode",
            Self::InvalidContainer(_) => "inspect",
        }
    }
}
