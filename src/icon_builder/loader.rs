//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / Base64 / 内存字节）的原始字节加载，
//! 并在解码之前完成体积与文件签名校验，尽快失败。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - Base64：兼容 Data URL 前缀，解码前按编码长度预估体积。
//! - 内存字节：仅做体积与签名校验。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::RawImageData;
use super::{IcoConfig, IcoError, IconHandler, ImageSource};

impl IconHandler {
    /// 按来源加载原始字节。
    pub(super) fn load_source(
        &self,
        source: &ImageSource,
        config: &IcoConfig,
    ) -> Result<RawImageData, IcoError> {
        match source {
            ImageSource::FilePath(path) => Self::load_from_file(path, config),
            ImageSource::Base64(data) => Self::load_from_base64(data, config),
            ImageSource::Bytes(bytes) => Self::load_from_bytes(bytes.clone(), config),
        }
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(path: &Path, config: &IcoConfig) -> Result<RawImageData, IcoError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(IcoError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| IcoError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        Self::validate_file_size(metadata.len(), config, "文件")?;

        let bytes = std::fs::read(path)
            .map_err(|e| IcoError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        let source_hint = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(RawImageData { bytes, source_hint })
    }

    /// 从 Base64 字符串加载图片原始字节。
    fn load_from_base64(data: &str, config: &IcoConfig) -> Result<RawImageData, IcoError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        Self::validate_file_size(bytes.len() as u64, config, "Base64 解码后体积")?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64".to_string(),
        })
    }

    fn load_from_bytes(bytes: Vec<u8>, config: &IcoConfig) -> Result<RawImageData, IcoError> {
        Self::validate_file_size(bytes.len() as u64, config, "内存图片")?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes".to_string(),
        })
    }

    fn validate_file_size(len: u64, config: &IcoConfig, label: &str) -> Result<(), IcoError> {
        match config.max_file_size {
            Some(limit) if len > limit => Err(IcoError::ResourceLimit(format!(
                "{}过大：{:.2} MB（限制：{:.2} MB）",
                label,
                len as f64 / 1024.0 / 1024.0,
                limit as f64 / 1024.0 / 1024.0
            ))),
            _ => Ok(()),
        }
    }

    /// 解析 Base64（兼容 `data:image/png;base64,` 前缀）。
    ///
    /// 设置了上限时，解码前先按编码长度估算原始体积，超限直接拒绝。
    pub(super) fn parse_base64_with_limit(
        data: &str,
        max_bytes: Option<u64>,
    ) -> Result<Vec<u8>, IcoError> {
        let trimmed = data.trim();
        let payload = match trimmed.split_once(',') {
            Some((header, body)) if header.starts_with("data:") => {
                if !header.ends_with(";base64") {
                    return Err(IcoError::InvalidFormat(
                        "Data URL 不是 base64 编码".to_string(),
                    ));
                }
                body
            }
            _ => trimmed,
        };

        let estimated = (payload.len() as u64 / 4).saturating_mul(3);
        if let Some(limit) = max_bytes.filter(|limit| estimated > *limit) {
            return Err(IcoError::ResourceLimit(format!(
                "Base64 数据过大：约 {:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                limit as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| IcoError::InvalidFormat(format!("Base64 解码失败：{}", e)))
    }

    /// 按魔数判断字节是否是图片，无法识别时按解码失败处理。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), IcoError> {
        match infer::get(bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
            Some(kind) => Err(IcoError::Decode(format!(
                "内容是 {}，不是图片",
                kind.mime_type()
            ))),
            None if bytes.is_empty() => Err(IcoError::Decode("图片内容为空".to_string())),
            None => Err(IcoError::Decode("无法识别的图片数据".to_string())),
        }
    }
}
