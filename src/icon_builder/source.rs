//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义（文件 / Base64 / 内存字节）
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SourceImage` 表示解码后的位图，由多个尺寸共享
//! - `SizeSlots` 表示“尺寸 → 可选源图”的不可变槽位表
//! - `EncodedImage` 表示某个尺寸最终写入容器的 PNG 字节

use std::fmt;
use std::path::PathBuf;

use image::{DynamicImage, RgbaImage};

/// 图标固定输出尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IconSize {
    X16,
    X32,
    X48,
    X64,
    X128,
    X256,
}

impl IconSize {
    /// 规范顺序（升序），同时也是目录项与载荷的写入顺序。
    pub const ALL: [IconSize; 6] = [
        IconSize::X16,
        IconSize::X32,
        IconSize::X48,
        IconSize::X64,
        IconSize::X128,
        IconSize::X256,
    ];

    /// 回退扫描顺序（降序）。
    pub const DESCENDING: [IconSize; 6] = [
        IconSize::X256,
        IconSize::X128,
        IconSize::X64,
        IconSize::X48,
        IconSize::X32,
        IconSize::X16,
    ];

    /// 边长（像素）。
    pub const fn pixels(self) -> u32 {
        match self {
            Self::X16 => 16,
            Self::X32 => 32,
            Self::X48 => 48,
            Self::X64 => 64,
            Self::X128 => 128,
            Self::X256 => 256,
        }
    }

    /// 目录项中宽/高字段的单字节编码：256 记为 0。
    pub const fn directory_byte(self) -> u8 {
        match self {
            Self::X256 => 0,
            other => other.pixels() as u8,
        }
    }

    pub fn from_pixels(pixels: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.pixels() == pixels)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::X16 => 0,
            Self::X32 => 1,
            Self::X48 => 2,
            Self::X64 => 3,
            Self::X128 => 4,
            Self::X256 => 5,
        }
    }
}

impl fmt::Display for IconSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.pixels())
    }
}

/// 尺寸槽位表：每个固定尺寸对应一个可选源。
///
/// 每次生成时构造一次，按值传递，不存在跨调用共享的可变槽位。
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSlots<T> {
    slots: [Option<T>; 6],
}

impl<T> Default for SizeSlots<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> SizeSlots<T> {
    /// 六个槽位全部为空。
    pub fn empty() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// 填充（或覆盖）某个槽位，返回新的槽位表。
    pub fn with(mut self, size: IconSize, source: T) -> Self {
        self.slots[size.index()] = Some(source);
        self
    }

    pub fn get(&self, size: IconSize) -> Option<&T> {
        self.slots[size.index()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// 已填充槽位数量。
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// 逐槽位转换；任一槽位转换失败即整体失败。
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<SizeSlots<U>, E>
    where
        F: FnMut(IconSize, T) -> Result<U, E>,
    {
        let mut mapped = SizeSlots::empty();
        for (size, slot) in IconSize::ALL.into_iter().zip(self.slots) {
            if let Some(source) = slot {
                mapped.slots[size.index()] = Some(f(size, source)?);
            }
        }
        Ok(mapped)
    }
}

impl<T> FromIterator<(IconSize, T)> for SizeSlots<T> {
    fn from_iter<I: IntoIterator<Item = (IconSize, T)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |slots, (size, source)| slots.with(size, source))
    }
}

/// 上传方式。
///
/// - `Single`：一张图填满全部六个尺寸
/// - `Dual`：小图负责 16/32，大图负责 48/64/128/256
/// - `Manual`：逐尺寸指定
#[derive(Debug, Clone)]
pub enum UploadMode<T> {
    Single(T),
    Dual { small: Option<T>, large: Option<T> },
    Manual(SizeSlots<T>),
}

impl<T: Clone> UploadMode<T> {
    /// 双图模式中由“小图”负责的尺寸。
    pub const DUAL_SMALL_SIZES: [IconSize; 2] = [IconSize::X16, IconSize::X32];
    /// 双图模式中由“大图”负责的尺寸。
    pub const DUAL_LARGE_SIZES: [IconSize; 4] =
        [IconSize::X48, IconSize::X64, IconSize::X128, IconSize::X256];

    /// 展开为统一的槽位表。
    pub fn into_slots(self) -> SizeSlots<T> {
        match self {
            Self::Single(source) => IconSize::ALL
                .into_iter()
                .map(|size| (size, source.clone()))
                .collect(),
            Self::Dual { small, large } => {
                let mut slots = SizeSlots::empty();
                if let Some(small) = small {
                    for size in Self::DUAL_SMALL_SIZES {
                        slots = slots.with(size, small.clone());
                    }
                }
                if let Some(large) = large {
                    for size in Self::DUAL_LARGE_SIZES {
                        slots = slots.with(size, large.clone());
                    }
                }
                slots
            }
            Self::Manual(slots) => slots,
        }
    }
}

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 已在内存中的原始字节（例如上层 UI 拖拽得到的文件内容）。
    Bytes(Vec<u8>),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: String,
}

/// 解码后的源图（统一为 32 位 RGBA）。
///
/// 生成期间只读，被多个尺寸通过 `Arc` 共享。
#[derive(Debug)]
pub struct SourceImage {
    pub(crate) image: RgbaImage,
    pub(crate) source_hint: String,
}

impl SourceImage {
    pub fn new(image: DynamicImage, source_hint: impl Into<String>) -> Self {
        Self {
            image: image.into_rgba8(),
            source_hint: source_hint.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn source_hint(&self) -> &str {
        &self.source_hint
    }
}

/// 某个尺寸的独立 PNG 编码结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub size: IconSize,
    pub data: Vec<u8>,
}

impl EncodedImage {
    pub fn new(size: IconSize, data: Vec<u8>) -> Self {
        Self { size, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_byte_encodes_256_as_zero() {
        let bytes: Vec<u8> = IconSize::ALL.iter().map(|s| s.directory_byte()).collect();
        assert_eq!(bytes, vec![16, 32, 48, 64, 128, 0]);
    }

    #[test]
    fn descending_is_reverse_of_all() {
        let mut reversed = IconSize::ALL;
        reversed.reverse();
        assert_eq!(reversed, IconSize::DESCENDING);
    }

    #[test]
    fn from_pixels_only_accepts_fixed_sizes() {
        assert_eq!(IconSize::from_pixels(48), Some(IconSize::X48));
        assert_eq!(IconSize::from_pixels(256), Some(IconSize::X256));
        assert_eq!(IconSize::from_pixels(24), None);
        assert_eq!(IconSize::from_pixels(0), None);
    }

    #[test]
    fn slots_with_overrides_previous_value() {
        let slots = SizeSlots::empty()
            .with(IconSize::X32, "a")
            .with(IconSize::X32, "b");

        assert_eq!(slots.get(IconSize::X32), Some(&"b"));
        assert_eq!(slots.filled_count(), 1);
    }

    #[test]
    fn try_map_stops_on_first_error() {
        let slots: SizeSlots<u32> = [(IconSize::X16, 1), (IconSize::X64, 2), (IconSize::X256, 3)]
            .into_iter()
            .collect();

        let mut visited = Vec::new();
        let result: Result<SizeSlots<u32>, &str> = slots.try_map(|size, value| {
            visited.push(size);
            if value == 2 { Err("boom") } else { Ok(value * 10) }
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(visited, vec![IconSize::X16, IconSize::X64]);
    }

    #[test]
    fn single_mode_fills_every_slot() {
        let slots = UploadMode::Single("logo").into_slots();
        assert_eq!(slots.filled_count(), 6);
        assert!(IconSize::ALL.iter().all(|s| slots.get(*s) == Some(&"logo")));
    }

    #[test]
    fn dual_mode_splits_small_and_large() {
        let slots = UploadMode::Dual {
            small: Some("small"),
            large: Some("large"),
        }
        .into_slots();

        assert_eq!(slots.get(IconSize::X16), Some(&"small"));
        assert_eq!(slots.get(IconSize::X32), Some(&"small"));
        for size in [IconSize::X48, IconSize::X64, IconSize::X128, IconSize::X256] {
            assert_eq!(slots.get(size), Some(&"large"));
        }
    }

    #[test]
    fn dual_mode_with_only_large_leaves_small_slots_empty() {
        let slots = UploadMode::Dual {
            small: None,
            large: Some("large"),
        }
        .into_slots();

        assert_eq!(slots.get(IconSize::X16), None);
        assert_eq!(slots.get(IconSize::X32), None);
        assert_eq!(slots.filled_count(), 4);
    }
}
