//! 元素计数、字节长度与字节偏移的强类型单位。
//!
//! 平铺拷贝引擎需要把“第几个元素”换算成“第几个字节”。这里把两种量纲拆成不同类型，
//! 换算只能经由 [`ElemCount::to_bytes`] 与 [`SlotIndex::to_byte_offset`]，
//! 避免在某条路径上漏乘或重复乘元素大小。

use core::{mem, ops::Sub};

use crate::error::{FifoError, Result};

/// 单个元素占用的字节数，恒大于 0。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ElementSize(usize);

impl ElementSize {
    /// 读取 `T` 的大小；零大小类型返回 `ZeroSizedElement`。
    pub(crate) fn of<T>() -> Result<Self> {
        match mem::size_of::<T>() {
            0 => Err(FifoError::ZeroSizedElement),
            size => Ok(Self(size)),
        }
    }

    /// 已由类型系统保证非零时使用，例如内联存储的编译期断言之后。
    pub(crate) const fn of_sized<T>() -> Self {
        Self(mem::size_of::<T>())
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// 逻辑元素个数。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ElemCount(usize);

impl ElemCount {
    pub(crate) const fn new(count: usize) -> Self {
        Self(count)
    }

    pub(crate) const fn of_slice<T>(slice: &[T]) -> Self {
        Self(slice.len())
    }

    pub(crate) const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// 元素数 × 元素大小。容量在构造期已校验不溢出，这里不再检查。
    pub(crate) const fn to_bytes(self, size: ElementSize) -> ByteLen {
        ByteLen(self.0 * size.0)
    }
}

/// 字节长度。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ByteLen(usize);

impl ByteLen {
    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

impl Sub for ByteLen {
    type Output = ByteLen;

    fn sub(self, rhs: ByteLen) -> ByteLen {
        ByteLen(self.0 - rhs.0)
    }
}

/// 存储区内的字节位置。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ByteOffset(usize);

impl ByteOffset {
    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// 从该偏移到存储区末尾还剩多少字节。
    pub(crate) const fn remaining_in(self, region: ByteLen) -> ByteLen {
        ByteLen(region.0 - self.0)
    }
}

/// 游标按掩码取模后的槽位下标，恒小于容量。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotIndex(usize);

impl SlotIndex {
    pub(crate) const fn get(self) -> usize {
        self.0
    }

    pub(crate) const fn to_byte_offset(self, size: ElementSize) -> ByteOffset {
        ByteOffset(self.0 * size.0)
    }
}

/// 槽位总数：2 的幂且不小于 2；释放后的动态队列使用 0 作为哨兵。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capacity(usize);

impl Capacity {
    pub(crate) const MIN: usize = 2;
    pub(crate) const RELEASED: Capacity = Capacity(0);

    /// 将请求容量向上取整到 2 的幂。
    ///
    /// - 取整溢出 → `CapacityOverflow`；
    /// - 取整结果小于 [`Capacity::MIN`]（请求 0 或 1）→ `CapacityTooSmall`。
    pub(crate) fn round_up(requested: usize) -> Result<Self> {
        let rounded = requested
            .checked_next_power_of_two()
            .ok_or(FifoError::CapacityOverflow { requested })?;
        if rounded < Self::MIN {
            return Err(FifoError::CapacityTooSmall { requested });
        }
        Ok(Self(rounded))
    }

    /// 由存储后端报告的容量重建；后端保证取值合法。
    pub(crate) fn trusted(slots: usize) -> Self {
        debug_assert!(slots == 0 || (slots >= Self::MIN && slots.is_power_of_two()));
        Self(slots)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }

    /// `capacity - 1`；释放态下为全 1，但此时不会有任何非零长度的访问。
    pub(crate) const fn mask(self) -> usize {
        self.0.wrapping_sub(1)
    }

    pub(crate) const fn slot(self, cursor: usize) -> SlotIndex {
        SlotIndex(cursor & self.mask())
    }
}
