//! # 槽位解析模块
//!
//! ## 设计思路
//!
//! 纯函数：输入稀疏的 `SizeSlots`，输出六个尺寸都已确定源图的 `ResolvedPlan`。
//!
//! ## 回退规则
//!
//! 按 256 → 16 降序扫描，遇到的第一个非空槽位即“最大可用源图”。
//! 任何空槽位（无论比它大还是小）都回退到这张图；自身有图的槽位始终用自己的图。
//! 所有槽位都为空时返回 `IcoError::NoSourceProvided`。

use super::{IcoError, IconSize, SizeSlots};

/// 回退解析后的完整计划。
///
/// 固定六项，按升序排列；同一个源可以出现多次（共享而非复制）。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlan<T> {
    entries: Vec<(IconSize, T)>,
}

impl<T> ResolvedPlan<T> {
    /// 按升序遍历 `(尺寸, 源)`。
    pub fn iter(&self) -> impl Iterator<Item = (IconSize, &T)> {
        self.entries.iter().map(|(size, source)| (*size, source))
    }

    pub fn get(&self, size: IconSize) -> &T {
        // 构造时保证六个尺寸齐全且按 `IconSize::ALL` 排列。
        &self.entries[size.index()].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 执行回退解析。
///
/// # 示例
/// ```rust
/// use icon_forge::icon_builder::{resolve_slots, IconSize, SizeSlots};
///
/// let slots = SizeSlots::empty()
///     .with(IconSize::X32, "small")
///     .with(IconSize::X128, "large");
/// let plan = resolve_slots(&slots)?;
///
/// assert_eq!(*plan.get(IconSize::X32), "small");
/// assert_eq!(*plan.get(IconSize::X16), "large");
/// assert_eq!(*plan.get(IconSize::X256), "large");
/// # Ok::<(), icon_forge::icon_builder::IcoError>(())
/// ```
pub fn resolve_slots<T: Clone>(slots: &SizeSlots<T>) -> Result<ResolvedPlan<T>, IcoError> {
    let fallback = IconSize::DESCENDING
        .into_iter()
        .find_map(|size| slots.get(size))
        .ok_or(IcoError::NoSourceProvided)?;

    let entries = IconSize::ALL
        .into_iter()
        .map(|size| (size, slots.get(size).unwrap_or(fallback).clone()))
        .collect();

    Ok(ResolvedPlan { entries })
}
