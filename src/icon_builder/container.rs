//! # ICO 容器编解码模块
//!
//! ## 文件布局（所有多字节整数均为小端）
//!
//! ```text
//! 偏移     长度   字段
//! 0        2      reserved = 0
//! 2        2      type = 1（图标）
//! 4        2      图片数量 N
//! 6        16×N   目录项
//! 6+16N    变长   依目录顺序拼接的 PNG 载荷，无填充
//! ```
//!
//! 目录项：
//!
//! ```text
//! 0  1  width  （256 记为 0）
//! 1  1  height （256 记为 0）
//! 2  1  colorCount = 0
//! 3  1  reserved = 0
//! 4  2  colorPlanes = 1
//! 6  2  bitsPerPixel = 32
//! 8  4  dataSize
//! 12 4  dataOffset（相对文件起始的绝对偏移）
//! ```
//!
//! 不变量：`sum(dataSize) + 6 + 16N == 文件长度`，且每个 `dataOffset` 恰好指向对应载荷起点。
//! 偏移依赖之前所有载荷的长度，因此必须在拿到完整有序列表后一次性计算。

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use super::{EncodedImage, IcoError};

/// 文件头长度。
pub const HEADER_LEN: usize = 6;
/// 单个目录项长度。
pub const DIRECTORY_ENTRY_LEN: usize = 16;

const RESERVED: u16 = 0;
const RESOURCE_TYPE_ICON: u16 = 1;
const COLOR_PLANES: u16 = 1;
const BITS_PER_PIXEL: u16 = 32;

/// 目录项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IconDirectoryEntry {
    pub width: u8,
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub color_planes: u16,
    pub bits_per_pixel: u16,
    pub data_size: u32,
    pub data_offset: u32,
}

impl IconDirectoryEntry {
    /// 实际宽度（字段为 0 时表示 256）。
    pub fn pixel_width(&self) -> u32 {
        if self.width == 0 { 256 } else { self.width as u32 }
    }

    /// 实际高度（字段为 0 时表示 256）。
    pub fn pixel_height(&self) -> u32 {
        if self.height == 0 { 256 } else { self.height as u32 }
    }

    fn write_to(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.width);
        buf.put_u8(self.height);
        buf.put_u8(self.color_count);
        buf.put_u8(self.reserved);
        buf.put_u16_le(self.color_planes);
        buf.put_u16_le(self.bits_per_pixel);
        buf.put_u32_le(self.data_size);
        buf.put_u32_le(self.data_offset);
    }

    fn read_from(buf: &mut impl Buf) -> Self {
        Self {
            width: buf.get_u8(),
            height: buf.get_u8(),
            color_count: buf.get_u8(),
            reserved: buf.get_u8(),
            color_planes: buf.get_u16_le(),
            bits_per_pixel: buf.get_u16_le(),
            data_size: buf.get_u32_le(),
            data_offset: buf.get_u32_le(),
        }
    }
}

/// 编码完成的容器文件，生成后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFile {
    bytes: Bytes,
}

impl ContainerFile {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// 按给定顺序组装 ICO 容器。
///
/// 目录项顺序与载荷顺序完全一致，调用方负责传入规范升序列表。
pub fn encode_container(images: &[EncodedImage]) -> Result<ContainerFile, IcoError> {
    if images.is_empty() {
        return Err(IcoError::Encode("容器至少需要一张图片".to_string()));
    }
    let count = u16::try_from(images.len())
        .map_err(|_| IcoError::Encode(format!("图片数量超出上限：{}", images.len())))?;

    let directory_end = HEADER_LEN + DIRECTORY_ENTRY_LEN * images.len();
    let mut offset = u32::try_from(directory_end)
        .map_err(|_| IcoError::Encode("目录长度超出 u32 范围".to_string()))?;

    let mut entries = Vec::with_capacity(images.len());
    for image in images {
        let data_size = u32::try_from(image.data.len()).map_err(|_| {
            IcoError::Encode(format!("{} 载荷超出 u32 范围：{} 字节", image.size, image.data.len()))
        })?;
        entries.push(IconDirectoryEntry {
            width: image.size.directory_byte(),
            height: image.size.directory_byte(),
            color_count: 0,
            reserved: 0,
            color_planes: COLOR_PLANES,
            bits_per_pixel: BITS_PER_PIXEL,
            data_size,
            data_offset: offset,
        });
        offset = offset
            .checked_add(data_size)
            .ok_or_else(|| IcoError::Encode("容器总长度超出 u32 范围".to_string()))?;
    }

    let total_len = offset as usize;
    let mut buf = BytesMut::with_capacity(total_len);
    buf.put_u16_le(RESERVED);
    buf.put_u16_le(RESOURCE_TYPE_ICON);
    buf.put_u16_le(count);
    for entry in &entries {
        entry.write_to(&mut buf);
    }
    for image in images {
        buf.put_slice(&image.data);
    }

    if buf.len() != total_len {
        return Err(IcoError::Encode(format!(
            "容器长度与目录不一致：实际 {} 字节，目录计算 {} 字节",
            buf.len(),
            total_len
        )));
    }

    Ok(ContainerFile { bytes: buf.freeze() })
}

/// 解析出的单张图片：目录项与其载荷切片。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerEntry<'a> {
    pub entry: IconDirectoryEntry,
    pub payload: &'a [u8],
}

/// 独立解析 ICO 容器，校验头部、目录长度与每个载荷的边界。
pub fn read_container(data: &[u8]) -> Result<Vec<ContainerEntry<'_>>, IcoError> {
    if data.len() < HEADER_LEN {
        return Err(IcoError::InvalidContainer(format!(
            "文件过短：{} 字节",
            data.len()
        )));
    }

    let mut cursor = data;
    let reserved = cursor.get_u16_le();
    let resource_type = cursor.get_u16_le();
    let count = cursor.get_u16_le() as usize;

    if reserved != RESERVED {
        return Err(IcoError::InvalidContainer(format!("保留字段非 0：{}", reserved)));
    }
    if resource_type != RESOURCE_TYPE_ICON {
        return Err(IcoError::InvalidContainer(format!(
            "资源类型不是图标：{}",
            resource_type
        )));
    }
    if cursor.remaining() < count * DIRECTORY_ENTRY_LEN {
        return Err(IcoError::InvalidContainer(format!(
            "目录被截断：声明 {} 项，剩余 {} 字节",
            count,
            cursor.remaining()
        )));
    }

    (0..count)
        .map(|index| -> Result<ContainerEntry, IcoError> {
            let entry = IconDirectoryEntry::read_from(&mut cursor);
            let start = entry.data_offset as usize;
            let end = start
                .checked_add(entry.data_size as usize)
                .filter(|end| *end <= data.len())
                .ok_or_else(|| {
                    IcoError::InvalidContainer(format!(
                        "第 {} 项载荷越界：offset={} size={} 文件={}",
                        index,
                        entry.data_offset,
                        entry.data_size,
                        data.len()
                    ))
                })?;
            Ok(ContainerEntry {
                entry,
                payload: &data[start..end],
            })
        })
        .collect()
}
