use alloc::alloc::{Layout, alloc_zeroed, dealloc};
use core::{cell::UnsafeCell, fmt, mem::MaybeUninit, ptr::NonNull};

use crate::{
    error::{FifoError, Result},
    sealed::Sealed,
    sync::SlotAccess,
    units::{Capacity, ElementSize},
};

/// FIFO 的底层槽位存储。
///
/// # 设计初衷（Why）
/// - 同一个 [`Fifo`](crate::Fifo) 既要支持编译期容量的内联数组，也要支持运行期容量的堆分配；
///   两者只在“槽位从哪里来、何时归还”上不同，拷贝引擎与游标算术完全共享。
///
/// # 契约定义（What）
/// - `capacity()` 返回 0（已释放）或不小于 2 的 2 的幂；
/// - `slots()` 指向 `capacity()` 个连续、按 `T` 对齐的槽位，在存储存活期间保持不变；
/// - 槽位可能未初始化，读取方只会访问先前写入过的槽位。
///
/// 该 trait 已封印，仅 [`InlineStorage`] 与 [`HeapStorage`] 实现。
pub trait Storage<T>: Sealed {
    /// 槽位总数。
    fn capacity(&self) -> usize;

    /// 首个槽位的裸指针。
    fn slots(&self) -> *mut MaybeUninit<T>;

    /// 与槽位一一对应的访问登记。
    #[doc(hidden)]
    fn access(&self) -> &SlotAccess;
}

/// 编译期容量的内联存储。
///
/// `N` 在实例化时经 `const` 断言校验：必须是不小于 2 的 2 的幂，且 `T` 不能是零大小类型。
pub struct InlineStorage<T, const N: usize> {
    slots: UnsafeCell<[MaybeUninit<T>; N]>,
    access: SlotAccess,
}

impl<T, const N: usize> InlineStorage<T, N> {
    /// 创建未初始化的槽位数组。
    pub fn new() -> Self {
        const {
            assert!(
                N >= Capacity::MIN && N.is_power_of_two(),
                "inline fifo capacity must be a power of two no smaller than 2"
            );
            assert!(
                ElementSize::of_sized::<T>().get() > 0,
                "zero-sized element types cannot back a fifo"
            );
        }
        Self {
            slots: UnsafeCell::new([const { MaybeUninit::uninit() }; N]),
            access: SlotAccess::with_slots(N),
        }
    }
}

impl<T, const N: usize> Default for InlineStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Sealed for InlineStorage<T, N> {}

impl<T, const N: usize> Storage<T> for InlineStorage<T, N> {
    fn capacity(&self) -> usize {
        N
    }

    fn slots(&self) -> *mut MaybeUninit<T> {
        self.slots.get().cast()
    }

    fn access(&self) -> &SlotAccess {
        &self.access
    }
}

impl<T, const N: usize> fmt::Debug for InlineStorage<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineStorage")
            .field("capacity", &N)
            .finish()
    }
}

/// 运行期容量的堆存储，独占其分配并保证只释放一次。
///
/// # 生命周期（How）
/// - [`HeapStorage::allocate`]：取整到 2 的幂、零初始化分配，仅尝试一次；
/// - [`HeapStorage::release`]：归还内存并退化为容量 0 的哨兵，可重复调用；
/// - `Drop`：作用域结束时自动调用 `release`，释放后的访问在类型层面不可能出现悬垂指针。
pub struct HeapStorage<T> {
    slots: NonNull<MaybeUninit<T>>,
    capacity: Capacity,
    layout: Layout,
    access: SlotAccess,
}

impl<T> HeapStorage<T> {
    /// 按请求容量分配零初始化的槽位。
    pub fn allocate(requested: usize) -> Result<Self> {
        let element = ElementSize::of::<T>().inspect_err(|_| {
            tracing::debug!(requested, "rejecting zero-sized fifo element type");
        })?;
        let capacity = Capacity::round_up(requested).inspect_err(|err| {
            tracing::debug!(requested, error = %err, "rejecting fifo capacity");
        })?;
        let layout = Layout::array::<T>(capacity.get())
            .map_err(|_| FifoError::CapacityOverflow { requested })?;

        // SAFETY: 布局大小为 capacity × size_of::<T>()，两者均非零。
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(slots) = NonNull::new(raw.cast::<MaybeUninit<T>>()) else {
            tracing::warn!(
                requested,
                bytes = layout.size(),
                "fifo storage allocation failed"
            );
            return Err(FifoError::OutOfMemory {
                bytes: layout.size(),
            });
        };

        tracing::debug!(
            requested,
            capacity = capacity.get(),
            element_size = element.get(),
            bytes = layout.size(),
            "fifo storage allocated"
        );
        Ok(Self {
            slots,
            capacity,
            layout,
            access: SlotAccess::with_slots(capacity.get()),
        })
    }

    /// 不持有任何内存的零容量存储。
    pub const fn released() -> Self {
        Self {
            slots: NonNull::dangling(),
            capacity: Capacity::RELEASED,
            layout: Layout::new::<()>(),
            access: SlotAccess::released(),
        }
    }

    /// 是否已经释放（或从未分配）。
    pub fn is_released(&self) -> bool {
        self.capacity == Capacity::RELEASED
    }

    /// 归还内存并清零容量；对已释放的存储是空操作。
    pub fn release(&mut self) {
        if self.is_released() {
            return;
        }
        let bytes = self.layout.size();
        // SAFETY: `slots` 与 `layout` 来自同一次 `alloc_zeroed`，且此前从未归还。
        unsafe { dealloc(self.slots.as_ptr().cast(), self.layout) };
        self.slots = NonNull::dangling();
        self.capacity = Capacity::RELEASED;
        self.layout = Layout::new::<()>();
        self.access = SlotAccess::released();
        tracing::debug!(bytes, "fifo storage released");
    }
}

impl<T> Drop for HeapStorage<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> Sealed for HeapStorage<T> {}

impl<T> Storage<T> for HeapStorage<T> {
    fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn slots(&self) -> *mut MaybeUninit<T> {
        self.slots.as_ptr()
    }

    fn access(&self) -> &SlotAccess {
        &self.access
    }
}

impl<T> fmt::Debug for HeapStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapStorage")
            .field("capacity", &self.capacity.get())
            .field("bytes", &self.layout.size())
            .finish()
    }
}

// SAFETY: 堆存储独占其分配，与 `Box<[T]>` 的线程语义一致。
unsafe impl<T: Send> Send for HeapStorage<T> {}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;

    #[test]
    fn allocation_rounds_up_and_zero_fills() {
        let storage = HeapStorage::<u32>::allocate(5).expect("分配应成功");
        assert_eq!(storage.capacity(), 8);
        let slots = storage.slots().cast::<u32>();
        for index in 0..8 {
            // SAFETY: 下标小于容量，且分配时已零初始化。
            assert_eq!(unsafe { slots.add(index).read() }, 0);
        }
    }

    #[test]
    fn release_is_idempotent_and_leaves_zero_capacity() {
        let mut storage = HeapStorage::<u8>::allocate(16).expect("分配应成功");
        storage.release();
        assert!(storage.is_released());
        assert_eq!(storage.capacity(), 0);
        storage.release();
        assert_eq!(storage.capacity(), 0);
    }

    #[test]
    fn zero_sized_elements_are_rejected() {
        assert_eq!(
            HeapStorage::<()>::allocate(16).err(),
            Some(FifoError::ZeroSizedElement)
        );
    }

    #[test]
    fn inline_storage_reports_its_const_capacity() {
        let storage = InlineStorage::<u64, 4>::new();
        assert_eq!(storage.capacity(), 4);
    }
}
