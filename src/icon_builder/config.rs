//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `IcoConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中性能档位（quality / balanced / speed）作为高层语义，映射到缩放滤镜。
//!
//! ## 实现思路
//!
//! - `Default` 提供平衡档位，且不设任何体积/像素/内存上限：能解码的图片都能生成图标。
//! - 上限均为可选项，由调用方（例如服务端部署）按需开启。
//! - `IcoPerformanceProfile` 负责档位字符串解析与反向输出。
//! - `IcoAdvancedConfig` 是可序列化的外部配置（JSON 文件），经范围校验后再落到 `IcoConfig`。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::IcoError;

/// 默认输出文件名。
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "icon.ico";

/// 图标生成配置。
#[derive(Debug, Clone)]
pub struct IcoConfig {
    /// 读取单个源文件时允许的最大体积（字节），`None` 表示不限制。
    pub max_file_size: Option<u64>,
    /// 解码后的像素上限（`width * height`），`None` 表示不限制。
    pub max_decoded_pixels: Option<u64>,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节），`None` 表示不限制。
    pub max_decoded_bytes: Option<u64>,
    /// 缩放滤镜。
    pub resize_filter: FilterType,
    /// 生成文件的建议文件名（必须以 `.ico` 结尾）。
    pub output_file_name: String,
}

impl Default for IcoConfig {
    fn default() -> Self {
        Self {
            max_file_size: None,
            max_decoded_pixels: None,
            max_decoded_bytes: None,
            resize_filter: FilterType::CatmullRom,
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
        }
    }
}

/// 缩放质量档位。
///
/// - `Quality`：Lanczos3，边缘最锐利
/// - `Balanced`：CatmullRom（双三次），默认
/// - `Speed`：Triangle（双线性）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcoPerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl IcoPerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use icon_forge::icon_builder::IcoPerformanceProfile;
    ///
    /// let p = IcoPerformanceProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), icon_forge::icon_builder::IcoError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, IcoError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(IcoError::InvalidFormat(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::Lanczos3,
            Self::Balanced => FilterType::CatmullRom,
            Self::Speed => FilterType::Triangle,
        }
    }
}

impl IcoConfig {
    /// 基于当前滤镜反推性能档位。
    pub(crate) fn infer_performance_profile(&self) -> IcoPerformanceProfile {
        match self.resize_filter {
            FilterType::Lanczos3 => IcoPerformanceProfile::Quality,
            FilterType::Triangle | FilterType::Nearest => IcoPerformanceProfile::Speed,
            FilterType::CatmullRom | FilterType::Gaussian => IcoPerformanceProfile::Balanced,
        }
    }

    /// 应用指定性能档位到实际参数。
    pub(crate) fn apply_performance_profile(&mut self, profile: IcoPerformanceProfile) {
        self.resize_filter = profile.filter();
    }

    /// 将外部高级配置校验后写入当前配置。
    ///
    /// 任一字段越界时整体拒绝，不做部分写入。未填写的上限保持关闭。
    pub(crate) fn apply_advanced(&mut self, advanced: &IcoAdvancedConfig) -> Result<(), IcoError> {
        let floors = [
            ("max_file_size", advanced.max_file_size, 1024),
            ("max_decoded_pixels", advanced.max_decoded_pixels, 256 * 256),
            ("max_decoded_bytes", advanced.max_decoded_bytes, 256 * 256 * 4),
        ];
        for (name, value, floor) in floors {
            if let Some(value) = value.filter(|v| *v < floor) {
                return Err(IcoError::InvalidFormat(format!(
                    "{} 不能小于 {}（当前 {}）",
                    name, floor, value
                )));
            }
        }
        validate_output_file_name(&advanced.output_file_name)?;
        let profile = IcoPerformanceProfile::from_str(&advanced.profile)?;

        self.max_file_size = advanced.max_file_size;
        self.max_decoded_pixels = advanced.max_decoded_pixels;
        self.max_decoded_bytes = advanced.max_decoded_bytes;
        self.output_file_name = advanced.output_file_name.trim().to_string();
        self.apply_performance_profile(profile);

        Ok(())
    }

    /// 导出当前配置为可序列化结构。
    pub(crate) fn to_advanced(&self) -> IcoAdvancedConfig {
        IcoAdvancedConfig {
            max_file_size: self.max_file_size,
            max_decoded_pixels: self.max_decoded_pixels,
            max_decoded_bytes: self.max_decoded_bytes,
            profile: self.infer_performance_profile().as_str().to_string(),
            output_file_name: self.output_file_name.clone(),
        }
    }
}

/// 可从 JSON 文件加载的高级配置。
///
/// 缺省字段取 `IcoConfig::default()` 的对应值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IcoAdvancedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_decoded_pixels: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_decoded_bytes: Option<u64>,
    pub profile: String,
    pub output_file_name: String,
}

impl Default for IcoAdvancedConfig {
    fn default() -> Self {
        IcoConfig::default().to_advanced()
    }
}

/// 输出文件名只允许单段文件名，且扩展名必须是 `.ico`。
pub(crate) fn validate_output_file_name(name: &str) -> Result<(), IcoError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(IcoError::InvalidFormat(format!("非法输出文件名：{:?}", name)));
    }
    if !trimmed.to_ascii_lowercase().ends_with(".ico") || trimmed.len() <= 4 {
        return Err(IcoError::InvalidFormat(format!(
            "输出文件名必须以 .ico 结尾：{}",
            name
        )));
    }
    Ok(())
}
