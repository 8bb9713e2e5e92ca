//! # 输出模块
//!
//! 将容器字节包装为可下载的产物（文件名 + 媒体类型）。
//! 这里只搬运字节，不做任何转换。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::validate_output_file_name;
use super::{ContainerFile, IcoError};

/// ICO 媒体类型。
pub const ICO_MEDIA_TYPE: &str = "image/x-icon";

/// 可交付的图标文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcoArtifact {
    file_name: String,
    media_type: &'static str,
    bytes: Bytes,
}

impl IcoArtifact {
    /// 包装容器字节。文件名必须以 `.ico` 结尾。
    pub fn new(container: ContainerFile, file_name: impl Into<String>) -> Result<Self, IcoError> {
        let file_name = file_name.into();
        validate_output_file_name(&file_name)?;

        Ok(Self {
            file_name: file_name.trim().to_string(),
            media_type: ICO_MEDIA_TYPE,
            bytes: container.into_bytes(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 写入磁盘。
    ///
    /// `target` 是已存在的目录时写到 `目录/文件名`，否则视为完整文件路径，
    /// 其文件名同样必须以 `.ico` 结尾。
    pub fn write_to(&self, target: &Path) -> Result<PathBuf, IcoError> {
        let path = if target.is_dir() {
            target.join(&self.file_name)
        } else {
            let name = target
                .file_name()
                .map(|name| name.to_string_lossy())
                .ok_or_else(|| {
                    IcoError::InvalidFormat(format!("输出路径缺少文件名：{}", target.display()))
                })?;
            validate_output_file_name(&name)?;
            target.to_path_buf()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                IcoError::FileSystem(format!("创建输出目录 '{}' 失败：{}", parent.display(), e))
            })?;
        }

        fs::write(&path, &self.bytes)
            .map_err(|e| IcoError::FileSystem(format!("写入 '{}' 失败：{}", path.display(), e)))?;

        log::info!("💾 已写入 {}（{} 字节）", path.display(), self.bytes.len());
        Ok(path)
    }

    /// 以 Data URL 形式输出，供前端直接触发下载。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
