//! # 解码、缩放与 PNG 编码流水线
//!
//! ## 设计思路
//!
//! 将“字节 → 位图 → 方形缩放 → PNG”的过程集中管理，并在解码前后做资源上限控制。
//!
//! ## 实现思路
//!
//! 1. 若配置了像素/内存上限，先读 header 尺寸快速拒绝；默认不设上限
//! 2. 关闭 `image` 自带的解码上限完整解码，并统一转换为 RGBA8
//! 3. 拉伸填满 S×S（不保持宽高比、不裁剪、不留边），优先 `fast_image_resize`
//! 4. 以 RGBA8 编码为独立 PNG

use fast_image_resize as fr;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::io::Cursor;

use super::source::RawImageData;
use super::{EncodedImage, IcoConfig, IcoError, IconHandler, IconSize, SourceImage};

impl IconHandler {
    /// 将原始字节解码为源图。
    ///
    /// 默认不设上限；只有配置了像素或内存上限时，才先读 header 尺寸做快速拒绝。
    pub(super) fn decode_source(
        &self,
        raw: RawImageData,
        config: &IcoConfig,
    ) -> Result<SourceImage, IcoError> {
        let limited = config.max_decoded_pixels.is_some() || config.max_decoded_bytes.is_some();
        if limited {
            let (width, height) = Self::reader_for(&raw)?
                .into_dimensions()
                .map_err(|e| IcoError::Decode(format!("{} 无法读取尺寸：{}", raw.source_hint, e)))?;
            Self::check_decode_budget(config, width, height)?;
        }

        let mut reader = Self::reader_for(&raw)?;
        reader.no_limits();
        let decoded = reader
            .decode()
            .map_err(|e| IcoError::Decode(format!("{} 解码失败：{}", raw.source_hint, e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(IcoError::Decode(format!(
                "{} 尺寸无效：{}x{}",
                raw.source_hint, width, height
            )));
        }
        if limited {
            Self::check_decode_budget(config, width, height)?;
        }

        log::info!(
            "✅ 源图解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(SourceImage::new(decoded, raw.source_hint))
    }

    fn reader_for(raw: &RawImageData) -> Result<ImageReader<Cursor<&[u8]>>, IcoError> {
        ImageReader::new(Cursor::new(raw.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| IcoError::Decode(format!("{} 无法识别图片格式：{}", raw.source_hint, e)))
    }

    /// 按已开启的上限检查像素数与 RGBA 解码内存。
    fn check_decode_budget(config: &IcoConfig, width: u32, height: u32) -> Result<(), IcoError> {
        let pixels = u64::from(width) * u64::from(height);

        if let Some(limit) = config.max_decoded_pixels.filter(|limit| pixels > *limit) {
            return Err(IcoError::ResourceLimit(format!(
                "{}x{} 共 {} 像素，超过上限 {}",
                width, height, pixels, limit
            )));
        }

        let rgba_bytes = pixels.saturating_mul(4);
        if let Some(limit) = config.max_decoded_bytes.filter(|limit| rgba_bytes > *limit) {
            return Err(IcoError::ResourceLimit(format!(
                "{}x{} 解码需约 {} 字节，超过上限 {}",
                width, height, rgba_bytes, limit
            )));
        }

        Ok(())
    }

    /// 缩放并编码单个尺寸，供阻塞线程池调用。
    pub(crate) fn render_size(
        source: &SourceImage,
        size: IconSize,
        filter: FilterType,
    ) -> Result<EncodedImage, IcoError> {
        let bitmap = Self::resample(source, size, filter)?;
        let data = Self::encode_png(&bitmap)?;

        log::debug!(
            "🧩 {} <- {}（{}x{}）PNG {} 字节",
            size,
            source.source_hint(),
            source.width(),
            source.height(),
            data.len()
        );

        Ok(EncodedImage::new(size, data))
    }

    /// 拉伸填满 S×S。源图不会被修改。
    pub(crate) fn resample(
        source: &SourceImage,
        size: IconSize,
        filter: FilterType,
    ) -> Result<RgbaImage, IcoError> {
        let target = size.pixels();

        match Self::resize_with_fast_image_resize(&source.image, target, filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 缩放失败，回退 imageops::resize：{}",
                    err
                );
                let resized = image::imageops::resize(&source.image, target, target, filter);
                if resized.dimensions() != (target, target) {
                    return Err(IcoError::Resample(format!(
                        "缩放输出尺寸异常：{:?}（期望 {}）",
                        resized.dimensions(),
                        size
                    )));
                }
                Ok(resized)
            }
        }
    }

    /// 直接借用源图缓冲区，六个并发任务共享同一份像素数据。
    fn resize_with_fast_image_resize(
        src: &RgbaImage,
        target: u32,
        filter: FilterType,
    ) -> Result<RgbaImage, IcoError> {
        let src_view = fr::images::ImageRef::new(
            src.width(),
            src.height(),
            src.as_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| IcoError::Resample(format!("源图缓冲无效：{}", e)))?;

        let mut dst = fr::images::Image::new(target, target, fr::PixelType::U8x4);
        let options =
            fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(convolution_filter(filter)));

        fr::Resizer::new()
            .resize(&src_view, &mut dst, Some(&options))
            .map_err(|e| IcoError::Resample(format!("fast_image_resize 执行失败：{}", e)))?;

        RgbaImage::from_raw(target, target, dst.into_vec())
            .ok_or_else(|| IcoError::Resample("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    /// 以 RGBA8 编码为独立 PNG。
    pub(crate) fn encode_png(bitmap: &RgbaImage) -> Result<Vec<u8>, IcoError> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                bitmap.as_raw(),
                bitmap.width(),
                bitmap.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| IcoError::Encode(format!("PNG 编码失败：{}", e)))?;
        Ok(buffer)
    }
}

/// `image` 滤镜到 `fast_image_resize` 卷积核的对应关系。
fn convolution_filter(filter: FilterType) -> fr::FilterType {
    use fr::FilterType as Kernel;

    match filter {
        FilterType::Lanczos3 => Kernel::Lanczos3,
        FilterType::CatmullRom => Kernel::CatmullRom,
        FilterType::Gaussian => Kernel::Mitchell,
        FilterType::Triangle => Kernel::Bilinear,
        FilterType::Nearest => Kernel::Box,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon_builder::test_support::{png_bytes, source_image};
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba};

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes,
            source_hint: "test".to_string(),
        }
    }

    #[test]
    fn decode_source_converts_to_rgba() {
        let handler = IconHandler::new(IcoConfig::default());
        let source = handler
            .decode_source(raw(png_bytes(40, 20)), &IcoConfig::default())
            .expect("decode failed");

        assert_eq!(source.dimensions(), (40, 20));
        assert_eq!(source.image.as_raw().len(), 40 * 20 * 4);
    }

    #[test]
    fn decode_source_rejects_garbage() {
        let handler = IconHandler::new(IcoConfig::default());
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(40);

        assert!(handler.decode_source(raw(bytes), &IcoConfig::default()).is_err());
    }

    #[test]
    fn decode_source_rejects_too_many_pixels() {
        let handler = IconHandler::new(IcoConfig::default());
        let config = IcoConfig {
            max_decoded_pixels: Some(100),
            ..IcoConfig::default()
        };

        let result = handler.decode_source(raw(png_bytes(20, 20)), &config);
        assert!(matches!(result, Err(IcoError::ResourceLimit(_))));
    }

    #[test]
    fn default_config_decodes_sources_above_forty_megapixels() {
        let huge = DynamicImage::ImageLuma8(GrayImage::from_pixel(8000, 5001, Luma([77])));
        let mut bytes = Cursor::new(Vec::new());
        huge.write_to(&mut bytes, ImageFormat::Png)
            .expect("failed to encode test image");

        let handler = IconHandler::default();
        let source = handler
            .decode_source(raw(bytes.into_inner()), &IcoConfig::default())
            .expect("large source must decode without limits");

        assert_eq!(source.dimensions(), (8000, 5001));
        let bitmap = IconHandler::resample(&source, IconSize::X16, FilterType::CatmullRom)
            .expect("resample failed");
        let Rgba([r, g, b, a]) = *bitmap.get_pixel(8, 8);
        assert!([r, g, b].iter().all(|c| c.abs_diff(77) <= 1));
        assert_eq!(a, 255);
    }

    #[test]
    fn decode_memory_limit_is_checked_before_full_decode() {
        let handler = IconHandler::default();
        let config = IcoConfig {
            max_decoded_bytes: Some(64 * 64 * 4),
            ..IcoConfig::default()
        };

        assert!(handler.decode_source(raw(png_bytes(64, 64)), &config).is_ok());
        assert!(matches!(
            handler.decode_source(raw(png_bytes(65, 64)), &config),
            Err(IcoError::ResourceLimit(_))
        ));
    }

    #[test]
    fn resample_stretches_non_square_sources() {
        let source = source_image(300, 50);

        for size in IconSize::ALL {
            let bitmap = IconHandler::resample(&source, size, FilterType::CatmullRom)
                .expect("resample failed");
            assert_eq!(bitmap.dimensions(), (size.pixels(), size.pixels()));
        }
        assert_eq!(source.dimensions(), (300, 50));
    }

    #[test]
    fn resample_upscales_tiny_sources() {
        let source = source_image(1, 1);
        let bitmap = IconHandler::resample(&source, IconSize::X256, FilterType::Lanczos3)
            .expect("resample failed");

        assert_eq!(bitmap.dimensions(), (256, 256));
    }

    #[test]
    fn resample_of_solid_color_keeps_the_color() {
        let solid = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            30,
            Rgba([200, 40, 10, 255]),
        ));
        let source = SourceImage::new(solid, "solid");

        let bitmap = IconHandler::resample(&source, IconSize::X48, FilterType::CatmullRom)
            .expect("resample failed");
        // 定点卷积允许 ±1 的舍入误差。
        let expected = [200_i16, 40, 10, 255];
        assert!(bitmap.pixels().all(|p| {
            p.0.iter()
                .zip(expected)
                .all(|(actual, want)| (*actual as i16 - want).abs() <= 1)
        }));
    }

    #[test]
    fn render_size_produces_decodable_png_of_requested_size() {
        let source = source_image(64, 64);
        let encoded = IconHandler::render_size(&source, IconSize::X32, FilterType::CatmullRom)
            .expect("render failed");

        assert_eq!(encoded.size, IconSize::X32);
        assert_eq!(&encoded.data[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let decoded = image::load_from_memory(&encoded.data).expect("png decode failed");
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
        assert_eq!(decoded.color(), image::ColorType::Rgba8);
    }

    #[test]
    fn render_size_is_deterministic() {
        let source = source_image(90, 70);
        let first = IconHandler::render_size(&source, IconSize::X128, FilterType::Lanczos3)
            .expect("render failed");
        let second = IconHandler::render_size(&source, IconSize::X128, FilterType::Lanczos3)
            .expect("render failed");

        assert_eq!(first, second);
    }
}
