//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，命令层所有函数统一返回 `Result<T, AppError>`，
//! 由入口打印一条可读的错误信息并以非零码退出。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `IcoError` / `std::io::Error` 提供 `From` 转换，无需手动 map。

use crate::icon_builder::IcoError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图标生成流水线错误（加载 / 解码 / 缩放 / 编码）
    #[error("[{}] {}", .0.stage(), .0)]
    Icon(#[from] IcoError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件无法解析或取值非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 命令行参数组合非法
    #[error("参数错误: {0}")]
    Usage(String),
}
