//! # 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做参数接收与结果输出，不承载业务逻辑。
//! 三种上传方式对应三组互斥参数：`--single`、`--small/--large`、`--slot SIZE=PATH`，
//! 统一转换为 `UploadMode<ImageSource>` 后交给 `IconHandler`。

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::icon_builder::{
    IcoAdvancedConfig, IcoError, IcoPerformanceProfile, IconHandler, IconSize, ImageSource,
    SizeSlots, UploadMode, read_container,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Parser, Debug)]
#[command(
    name = "icon-forge",
    version,
    about = "把 PNG/JPEG 打包为 16~256 六尺寸的 .ico 图标"
)]
pub struct Cli {
    /// 缩放档位：quality / balanced / speed
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// 高级配置 JSON 文件
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 生成 .ico 文件
    Build {
        #[command(flatten)]
        inputs: SlotArgs,
        /// 输出路径（目录或文件），默认当前目录下的配置文件名
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 以 JSON 输出每个尺寸的 PNG Data URL 预览
    Preview {
        #[command(flatten)]
        inputs: SlotArgs,
    },

    /// 解析并打印 .ico 文件的目录
    Inspect {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// 三种上传方式的参数组。
#[derive(Args, Debug, Default, Clone)]
pub struct SlotArgs {
    /// 单图模式：一张图填满全部尺寸
    #[arg(long, conflicts_with_all = ["small", "large", "slots"])]
    pub single: Option<PathBuf>,

    /// 双图模式：负责 16/32 的小图
    #[arg(long, conflicts_with = "slots")]
    pub small: Option<PathBuf>,

    /// 双图模式：负责 48/64/128/256 的大图
    #[arg(long, conflicts_with = "slots")]
    pub large: Option<PathBuf>,

    /// 手动模式：SIZE=PATH，可重复，SIZE 取 16/32/48/64/128/256
    #[arg(long = "slot", value_parser = parse_slot)]
    pub slots: Vec<(IconSize, PathBuf)>,
}

impl SlotArgs {
    /// 转换为统一的上传方式。
    pub fn into_mode(self) -> Result<UploadMode<ImageSource>, AppError> {
        if let Some(single) = self.single {
            return Ok(UploadMode::Single(ImageSource::FilePath(single)));
        }

        if self.small.is_some() || self.large.is_some() {
            return Ok(UploadMode::Dual {
                small: self.small.map(ImageSource::FilePath),
                large: self.large.map(ImageSource::FilePath),
            });
        }

        if self.slots.is_empty() {
            return Err(IcoError::NoSourceProvided.into());
        }

        let mut seen = HashSet::with_capacity(self.slots.len());
        if let Some((size, path)) = self.slots.iter().find(|(size, _)| !seen.insert(*size)) {
            return Err(AppError::Usage(format!(
                "尺寸 {} 重复指定：{}",
                size,
                path.display()
            )));
        }

        Ok(UploadMode::Manual(
            self.slots
                .into_iter()
                .map(|(size, path)| (size, ImageSource::FilePath(path)))
                .collect::<SizeSlots<_>>(),
        ))
    }
}

/// 解析 `SIZE=PATH`。
pub fn parse_slot(value: &str) -> Result<(IconSize, PathBuf), String> {
    let (size, path) = value
        .split_once('=')
        .ok_or_else(|| format!("格式应为 SIZE=PATH：{}", value))?;

    let pixels: u32 = size
        .trim()
        .parse()
        .map_err(|_| format!("尺寸不是整数：{}", size))?;
    let size = IconSize::from_pixels(pixels)
        .ok_or_else(|| format!("不支持的尺寸：{}（可选 16/32/48/64/128/256）", pixels))?;

    let path = path.trim();
    if path.is_empty() {
        return Err(format!("{} 的路径为空", size));
    }

    Ok((size, PathBuf::from(path)))
}

/// 按全局参数构造生成器：先应用配置文件，再用 `--profile` 覆盖档位。
pub fn build_handler(
    profile: Option<&str>,
    config_path: Option<&Path>,
) -> Result<IconHandler, AppError> {
    let handler = IconHandler::default();

    if let Some(path) = config_path {
        let content = std::fs::read_to_string(path)?;
        let advanced: IcoAdvancedConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析 {} 失败: {}", path.display(), e)))?;
        handler.set_advanced_config(&advanced)?;
        log::info!("⚙️ 已加载配置文件 {}", path.display());
    }

    if let Some(profile) = profile {
        handler.set_performance_profile(IcoPerformanceProfile::from_str(profile)?)?;
    }

    Ok(handler)
}

/// 执行 `build`，返回写入的文件路径。
pub async fn run_build(
    handler: &IconHandler,
    inputs: SlotArgs,
    out: Option<&Path>,
) -> Result<PathBuf, AppError> {
    let artifact = handler.build_icon(inputs.into_mode()?).await?;
    let target = out.unwrap_or_else(|| Path::new("."));
    Ok(artifact.write_to(target)?)
}

/// 执行 `preview`，返回 JSON 文本。
pub async fn run_preview(handler: &IconHandler, inputs: SlotArgs) -> Result<String, AppError> {
    let slots = match inputs.into_mode() {
        Ok(mode) => mode.into_slots(),
        Err(AppError::Icon(IcoError::NoSourceProvided)) => SizeSlots::empty(),
        Err(err) => return Err(err),
    };

    let previews = handler.render_previews(slots).await?;
    serde_json::to_string_pretty(&previews)
        .map_err(|e| AppError::Config(format!("序列化预览失败: {}", e)))
}

/// `inspect` 的单项输出。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InspectEntry {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub data_size: u32,
    pub data_offset: u32,
    pub payload_format: &'static str,
}

/// `inspect` 的整体输出。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InspectReport {
    pub total_bytes: usize,
    pub entries: Vec<InspectEntry>,
}

impl InspectReport {
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!(
            "{} 字节，{} 张图片",
            self.total_bytes,
            self.entries.len()
        )];
        lines.extend(self.entries.iter().map(|e| {
            format!(
                "#{} {}x{} {}bpp {} size={} offset={}",
                e.index, e.width, e.height, e.bits_per_pixel, e.payload_format, e.data_size, e.data_offset
            )
        }));
        lines.join("\n")
    }
}

/// 解析 `.ico` 文件目录。
pub fn inspect_file(path: &Path) -> Result<InspectReport, AppError> {
    let data = std::fs::read(path)?;
    inspect_bytes(&data)
}

pub fn inspect_bytes(data: &[u8]) -> Result<InspectReport, AppError> {
    let entries = read_container(data)?
        .into_iter()
        .enumerate()
        .map(|(index, parsed)| InspectEntry {
            index,
            width: parsed.entry.pixel_width(),
            height: parsed.entry.pixel_height(),
            bits_per_pixel: parsed.entry.bits_per_pixel,
            data_size: parsed.entry.data_size,
            data_offset: parsed.entry.data_offset,
            payload_format: if parsed.payload.starts_with(&PNG_SIGNATURE) {
                "png"
            } else {
                "dib"
            },
        })
        .collect();

    Ok(InspectReport {
        total_bytes: data.len(),
        entries,
    })
}

/// 命令分发。
pub async fn run(cli: Cli) -> Result<(), AppError> {
    log::debug!("▶ 命令参数: {:?}", cli.cmd);

    match cli.cmd {
        Commands::Build { inputs, out } => {
            let handler = build_handler(cli.profile.as_deref(), cli.config.as_deref())?;
            let written = run_build(&handler, inputs, out.as_deref()).await?;
            println!("{}", written.display());
        }
        Commands::Preview { inputs } => {
            let handler = build_handler(cli.profile.as_deref(), cli.config.as_deref())?;
            println!("{}", run_preview(&handler, inputs).await?);
        }
        Commands::Inspect { file, json } => {
            let report = inspect_file(&file)?;
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| AppError::Config(format!("序列化报告失败: {}", e)))?;
                println!("{}", text);
            } else {
                println!("{}", report.to_text());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_slot_accepts_fixed_sizes() {
        let (size, path) = parse_slot("256=art/large.png").expect("parse failed");
        assert_eq!(size, IconSize::X256);
        assert_eq!(path, PathBuf::from("art/large.png"));
    }

    #[test]
    fn parse_slot_rejects_bad_input() {
        assert!(parse_slot("24=a.png").is_err());
        assert!(parse_slot("abc=a.png").is_err());
        assert!(parse_slot("16").is_err());
        assert!(parse_slot("16=").is_err());
    }

    #[test]
    fn manual_slots_are_parsed_from_command_line() {
        let cli = Cli::try_parse_from([
            "icon-forge", "build", "--slot", "16=s.png", "--slot", "128=l.png", "-o", "out.ico",
        ])
        .expect("cli parse failed");

        let Commands::Build { inputs, out } = cli.cmd else {
            panic!("expected build command");
        };
        assert_eq!(out, Some(PathBuf::from("out.ico")));

        let UploadMode::Manual(slots) = inputs.into_mode().expect("mode failed") else {
            panic!("expected manual mode");
        };
        assert_eq!(slots.filled_count(), 2);
        assert_eq!(
            slots.get(IconSize::X128),
            Some(&ImageSource::FilePath(PathBuf::from("l.png")))
        );
    }

    #[test]
    fn single_conflicts_with_other_modes() {
        let result = Cli::try_parse_from([
            "icon-forge", "build", "--single", "a.png", "--slot", "16=b.png",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn dual_flags_map_to_dual_mode() {
        let inputs = SlotArgs {
            large: Some(PathBuf::from("big.png")),
            ..SlotArgs::default()
        };

        let UploadMode::Dual { small, large } = inputs.into_mode().expect("mode failed") else {
            panic!("expected dual mode");
        };
        assert!(small.is_none());
        assert_eq!(large, Some(ImageSource::FilePath(PathBuf::from("big.png"))));
    }

    #[test]
    fn repeated_slot_size_is_a_usage_error() {
        let inputs = SlotArgs {
            slots: vec![
                (IconSize::X32, PathBuf::from("a.png")),
                (IconSize::X32, PathBuf::from("b.png")),
            ],
            ..SlotArgs::default()
        };
        assert!(matches!(inputs.into_mode(), Err(AppError::Usage(_))));
    }

    #[test]
    fn no_inputs_is_reported_as_missing_source() {
        let result = SlotArgs::default().into_mode();
        assert!(matches!(result, Err(AppError::Icon(IcoError::NoSourceProvided))));
    }

    #[test]
    fn inspect_rejects_non_ico_bytes() {
        let result = inspect_bytes(b"\x89PNG\r\n\x1a\n");
        assert!(matches!(result, Err(AppError::Icon(IcoError::InvalidContainer(_)))));
    }

    #[test]
    fn build_handler_applies_profile_override() {
        let handler = build_handler(Some("speed"), None).expect("handler failed");
        assert_eq!(
            handler.get_performance_profile().expect("profile failed"),
            IcoPerformanceProfile::Speed
        );
    }

    #[test]
    fn build_handler_rejects_unknown_profile() {
        assert!(build_handler(Some("turbo"), None).is_err());
    }
}
