//! 原子类型与槽位访问登记的入口。
//!
//! 启用 `--cfg loom` 时切换到 loom 提供的原子类型，使游标发布顺序进入模型检查；
//! 其余情况下直接使用 core 原子，零额外开销。
#[cfg(not(any(loom, spark_loom)))]
pub(crate) use core::sync::atomic::{AtomicUsize, Ordering};
#[cfg(any(loom, spark_loom))]
pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};

/// 槽位访问登记。
///
/// # 契约说明（What）
/// - loom 模型下每个槽位对应一个 `loom::cell::UnsafeCell<()>`：拷贝引擎写完槽位后登记一次
///   `with_mut`，读取槽位前登记一次 `with`。若负载写入与对端读取之间缺少经由游标
///   `Release`/`Acquire` 建立的先行关系，模型报告因果违例；
/// - 其余情况下为零大小类型，登记是空操作。
///
/// 槽位数为 0（已释放）或 2 的幂；登记的下标按槽位数取模。
#[cfg(not(any(loom, spark_loom)))]
#[derive(Debug)]
pub struct SlotAccess;

#[cfg(not(any(loom, spark_loom)))]
impl SlotAccess {
    pub(crate) fn with_slots(_slots: usize) -> Self {
        Self
    }

    pub(crate) const fn released() -> Self {
        Self
    }

    #[inline(always)]
    pub(crate) fn wrote(&self, _first: usize, _count: usize) {}

    #[inline(always)]
    pub(crate) fn read(&self, _first: usize, _count: usize) {}
}

#[cfg(any(loom, spark_loom))]
pub struct SlotAccess {
    cells: alloc::vec::Vec<loom::cell::UnsafeCell<()>>,
}

#[cfg(any(loom, spark_loom))]
impl SlotAccess {
    pub(crate) fn with_slots(slots: usize) -> Self {
        Self {
            cells: (0..slots).map(|_| loom::cell::UnsafeCell::new(())).collect(),
        }
    }

    pub(crate) const fn released() -> Self {
        Self {
            cells: alloc::vec::Vec::new(),
        }
    }

    pub(crate) fn wrote(&self, first: usize, count: usize) {
        for slot in self.slots(first, count) {
            self.cells[slot].with_mut(|_| ());
        }
    }

    pub(crate) fn read(&self, first: usize, count: usize) {
        for slot in self.slots(first, count) {
            self.cells[slot].with(|_| ());
        }
    }

    fn slots(&self, first: usize, count: usize) -> impl Iterator<Item = usize> {
        let mask = self.cells.len().wrapping_sub(1);
        (0..count).map(move |step| first.wrapping_add(step) & mask)
    }
}

#[cfg(any(loom, spark_loom))]
impl core::fmt::Debug for SlotAccess {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotAccess")
            .field("slots", &self.cells.len())
            .finish()
    }
}
