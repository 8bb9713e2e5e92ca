//! # 预览模块
//!
//! 按与生成完全相同的回退与缩放规则，为每个尺寸渲染 `data:image/png;base64,...`。
//! 没有任何源图时，每个尺寸都返回空预览（由界面显示占位），而不是报错。

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;

use super::{IcoError, IconHandler, IconSize, ImageSource, SizeSlots, resolve_slots};

/// 单个尺寸的预览。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizePreview {
    pub size: u32,
    /// 为 `None` 时表示该尺寸暂无可用源图。
    pub data_url: Option<String>,
}

impl IconHandler {
    /// 渲染六个尺寸的预览，按降序排列（与界面展示顺序一致）。
    pub async fn render_previews(
        &self,
        slots: SizeSlots<ImageSource>,
    ) -> Result<Vec<SizePreview>, IcoError> {
        if slots.is_empty() {
            return Ok(IconSize::DESCENDING
                .into_iter()
                .map(|size| SizePreview {
                    size: size.pixels(),
                    data_url: None,
                })
                .collect());
        }

        let config = self.config_snapshot()?;
        let decoded = self.load_slots(slots, &config)?;
        let plan = resolve_slots(&decoded)?;
        let encoded = Self::render_plan(&plan, config.resize_filter).await?;

        let mut previews: Vec<SizePreview> = encoded
            .into_iter()
            .map(|image| SizePreview {
                size: image.size.pixels(),
                data_url: Some(format!(
                    "data:image/png;base64,{}",
                    general_purpose::STANDARD.encode(&image.data)
                )),
            })
            .collect();
        previews.reverse();

        Ok(previews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon_builder::test_support::png_bytes;

    #[tokio::test]
    async fn empty_slots_render_placeholders() {
        let previews = IconHandler::default()
            .render_previews(SizeSlots::empty())
            .await
            .expect("preview failed");

        let sizes: Vec<u32> = previews.iter().map(|p| p.size).collect();
        assert_eq!(sizes, vec![256, 128, 64, 48, 32, 16]);
        assert!(previews.iter().all(|p| p.data_url.is_none()));
    }

    #[tokio::test]
    async fn previews_are_png_data_urls_of_each_size() {
        let slots = SizeSlots::empty().with(IconSize::X48, ImageSource::Bytes(png_bytes(48, 48)));
        let previews = IconHandler::default()
            .render_previews(slots)
            .await
            .expect("preview failed");

        for preview in previews {
            let url = preview.data_url.expect("preview missing");
            let payload = url
                .strip_prefix("data:image/png;base64,")
                .expect("unexpected prefix");
            let png = general_purpose::STANDARD.decode(payload).expect("base64 failed");
            let decoded = image::load_from_memory(&png).expect("png decode failed");
            assert_eq!((decoded.width(), decoded.height()), (preview.size, preview.size));
        }
    }
}
