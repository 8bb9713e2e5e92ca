//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `IconHandler` 只负责流程编排与配置管理，处理链路固定为：
//! 1. 读取配置快照
//! 2. 校验至少有一个槽位非空
//! 3. 按槽位加载并解码源图（相同来源只解码一次）
//! 4. 回退解析得到六个尺寸的完整计划
//! 5. 每个尺寸独立缩放 + PNG 编码（并发发起，按规范顺序收集）
//! 6. 组装 ICO 容器并包装为产物
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<IcoConfig>>` 支持运行时切档，单次请求内使用同一快照。
//! - 任一阶段失败即整单失败，尚未完成的缩放任务会被取消，不产出任何半成品。
//! - 记录 `load/render/pack/total` 阶段耗时，便于性能诊断。

use image::imageops::FilterType;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{
    ContainerFile, EncodedImage, IcoAdvancedConfig, IcoArtifact, IcoConfig, IcoError,
    IcoPerformanceProfile, IconSize, ImageSource, ResolvedPlan, SizeSlots, SourceImage,
    UploadMode, encode_container, resolve_slots,
};

/// 图标生成器。
#[derive(Debug, Clone)]
pub struct IconHandler {
    config: Arc<RwLock<IcoConfig>>,
}

impl Default for IconHandler {
    fn default() -> Self {
        Self::new(IcoConfig::default())
    }
}

impl IconHandler {
    /// 根据初始配置创建生成器。
    pub fn new(config: IcoConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照，保证单次请求链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<IcoConfig, IcoError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| IcoError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置缩放质量档位。
    pub fn set_performance_profile(&self, profile: IcoPerformanceProfile) -> Result<(), IcoError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| IcoError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换缩放档位：{:?}（filter={:?}）",
            profile,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<IcoPerformanceProfile, IcoError> {
        Ok(self.config_snapshot()?.infer_performance_profile())
    }

    /// 应用高级配置（体积/像素/内存上限、档位、输出文件名）。
    pub fn set_advanced_config(&self, advanced: &IcoAdvancedConfig) -> Result<(), IcoError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| IcoError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_advanced(advanced)
    }

    /// 获取高级配置快照。
    pub fn get_advanced_config(&self) -> Result<IcoAdvancedConfig, IcoError> {
        Ok(self.config_snapshot()?.to_advanced())
    }

    /// 处理主入口：按上传方式生成 `.ico` 产物。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use icon_forge::icon_builder::{IconHandler, ImageSource, UploadMode};
    ///
    /// # async fn demo() -> Result<(), icon_forge::icon_builder::IcoError> {
    /// let handler = IconHandler::default();
    /// let artifact = handler
    ///     .build_icon(UploadMode::Single(ImageSource::FilePath("logo.png".into())))
    ///     .await?;
    /// assert_eq!(artifact.file_name(), "icon.ico");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build_icon(&self, mode: UploadMode<ImageSource>) -> Result<IcoArtifact, IcoError> {
        self.build_from_slots(mode.into_slots()).await
    }

    /// 按槽位表生成 `.ico` 产物。
    pub async fn build_from_slots(
        &self,
        slots: SizeSlots<ImageSource>,
    ) -> Result<IcoArtifact, IcoError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let decoded = self.load_slots(slots, &config)?;
        let load_elapsed = load_start.elapsed();

        let plan = resolve_slots(&decoded)?;

        let render_start = Instant::now();
        let encoded = Self::render_plan(&plan, config.resize_filter).await?;
        let render_elapsed = render_start.elapsed();

        let pack_start = Instant::now();
        let container = encode_container(&encoded)?;
        let artifact = IcoArtifact::new(container, config.output_file_name.as_str())?;
        let pack_elapsed = pack_start.elapsed();

        log::info!(
            "✅ 图标生成完成 - {} 字节 load={}ms render={}ms pack={}ms total={}ms",
            artifact.len(),
            load_elapsed.as_millis(),
            render_elapsed.as_millis(),
            pack_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(artifact)
    }

    /// 加载并解码所有已填充槽位。
    ///
    /// 同一来源出现在多个槽位时只解码一次，解码结果通过 `Arc` 共享。
    pub(super) fn load_slots(
        &self,
        slots: SizeSlots<ImageSource>,
        config: &IcoConfig,
    ) -> Result<SizeSlots<Arc<SourceImage>>, IcoError> {
        if slots.is_empty() {
            return Err(IcoError::NoSourceProvided);
        }

        let mut decoded_cache: Vec<(ImageSource, Arc<SourceImage>)> = Vec::new();
        slots.try_map(|size, source| {
            if let Some((_, cached)) = decoded_cache.iter().find(|(seen, _)| *seen == source) {
                log::debug!("♻️ {} 复用已解码的源图 {}", size, cached.source_hint());
                return Ok(Arc::clone(cached));
            }

            let raw = self.load_source(&source, config)?;
            let image = Arc::new(self.decode_source(raw, config)?);
            decoded_cache.push((source, Arc::clone(&image)));
            Ok(image)
        })
    }

    /// 对完整计划逐尺寸缩放并编码。
    ///
    /// 六个任务同时发起、按升序等待；任一失败时取消其余任务并返回错误。
    pub async fn render_plan(
        plan: &ResolvedPlan<Arc<SourceImage>>,
        filter: FilterType,
    ) -> Result<Vec<EncodedImage>, IcoError> {
        Self::render_plan_with(plan, move |source, size| {
            Self::render_size(source, size, filter)
        })
        .await
    }

    async fn render_plan_with<F>(
        plan: &ResolvedPlan<Arc<SourceImage>>,
        render: F,
    ) -> Result<Vec<EncodedImage>, IcoError>
    where
        F: Fn(&SourceImage, IconSize) -> Result<EncodedImage, IcoError>
            + Clone
            + Send
            + 'static,
    {
        let handles: Vec<_> = plan
            .iter()
            .map(|(size, source)| {
                let source = Arc::clone(source);
                let render = render.clone();
                let handle = tokio::task::spawn_blocking(move || render(&source, size));
                (size, handle)
            })
            .collect();

        let mut encoded = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some((size, handle)) = pending.next() {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(IcoError::Resample(format!(
                    "{} 缩放任务异常终止：{}",
                    size, join_err
                ))),
            };

            match result {
                Ok(image) => encoded.push(image),
                Err(err) => {
                    for (_, rest) in pending {
                        rest.abort();
                    }
                    log::error!("❌ {} 处理失败，放弃整个图标：{}", size, err);
                    return Err(err);
                }
            }
        }

        Ok(encoded)
    }

    /// 已解码源图直接生成容器（跳过加载阶段）。
    pub async fn encode_decoded(
        &self,
        slots: &SizeSlots<Arc<SourceImage>>,
    ) -> Result<ContainerFile, IcoError> {
        let config = self.config_snapshot()?;
        let plan = resolve_slots(slots)?;
        let encoded = Self::render_plan(&plan, config.resize_filter).await?;
        encode_container(&encoded)
    }
}
