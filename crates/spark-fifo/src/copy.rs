//! 平铺拷贝引擎：整个 crate 中唯一处理环绕的位置。
//!
//! 给定逻辑偏移（以元素计）与长度，先拷贝到存储区末尾为止的第一段，
//! 再把剩余部分折回（fold）到存储区开头。拷贝不移动任何游标，
//! 由调用方在成功后推进，因此“窥视”可以复用同一套例程。
//!
//! 每次拷贝都向存储的 [`SlotAccess`] 登记：写入在拷贝之后登记，读取在拷贝之前登记，
//! loom 模型据此检查负载访问是否被游标发布正确排序。

use core::{marker::PhantomData, mem::MaybeUninit, ptr};

use crate::{
    storage::Storage,
    sync::SlotAccess,
    units::{ByteLen, Capacity, ElemCount, ElementSize},
};

/// 某个存储的一次性视图：基址、容量与元素大小。
///
/// # 契约说明（What）
/// - 视图不拥有内存，只在借出它的 `Fifo` 存活期间有效；
/// - 所有拷贝方法都是 `unsafe`：调用方必须保证被写区间当前不被另一方读取，
///   被读区间此前已被完整写入。单生产者/单消费者协议正好满足这两点。
pub(crate) struct Region<T> {
    slots: *mut MaybeUninit<T>,
    capacity: Capacity,
    element: ElementSize,
    access: *const SlotAccess,
    _marker: PhantomData<T>,
}

impl<T> Clone for Region<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Region<T> {}

impl<T: Copy> Region<T> {
    pub(crate) fn of<S: Storage<T>>(storage: &S) -> Self {
        Self {
            slots: storage.slots(),
            capacity: Capacity::trusted(storage.capacity()),
            element: ElementSize::of_sized::<T>(),
            access: storage.access(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn capacity(self) -> Capacity {
        self.capacity
    }

    fn bytes(self) -> *mut u8 {
        self.slots.cast()
    }

    fn access(&self) -> &SlotAccess {
        // SAFETY: 视图只在借出它的存储存活期间使用，登记表与槽位同生同灭。
        unsafe { &*self.access }
    }

    fn byte_len(self) -> ByteLen {
        ElemCount::new(self.capacity.get()).to_bytes(self.element)
    }

    /// 计算从逻辑偏移 `offset` 开始、长度 `len` 的访问在存储区中的两段：
    /// 返回 `(起始字节, 第一段字节数, 折回段字节数)`。
    fn split(self, len: ElemCount, offset: usize) -> (usize, usize, usize) {
        debug_assert!(len.get() <= self.capacity.get());
        let start = self.capacity.slot(offset).to_byte_offset(self.element);
        let total = len.to_bytes(self.element);
        let first = total.min(start.remaining_in(self.byte_len()));
        (start.get(), first.get(), (total - first).get())
    }

    /// 把 `src` 拷入从逻辑偏移 `offset` 开始的区间。
    ///
    /// # Safety
    /// `src.len()` 不超过容量，且目标区间不与对端正在读取的区间重叠。
    pub(crate) unsafe fn copy_in(self, src: &[T], offset: usize) {
        let len = ElemCount::of_slice(src);
        if len.is_zero() {
            return;
        }
        let (start, first, fold) = self.split(len, offset);
        let src = src.as_ptr().cast::<u8>();
        // SAFETY: `first + fold` 等于源切片的字节数；`first` 不越过存储区末尾，
        // `fold` 不超过容量，目标区间由调用方保证无人读取。
        unsafe {
            ptr::copy_nonoverlapping(src, self.bytes().add(start), first);
            ptr::copy_nonoverlapping(src.add(first), self.bytes(), fold);
        }
        self.access().wrote(self.capacity.slot(offset).get(), len.get());
    }

    /// 把从逻辑偏移 `offset` 开始的区间拷出到 `dst`。
    ///
    /// # Safety
    /// `dst.len()` 不超过容量，且源区间中的每个槽位此前都已写入。
    pub(crate) unsafe fn copy_out(self, dst: &mut [T], offset: usize) {
        let len = ElemCount::of_slice(dst);
        if len.is_zero() {
            return;
        }
        self.access().read(self.capacity.slot(offset).get(), len.get());
        let (start, first, fold) = self.split(len, offset);
        let dst = dst.as_mut_ptr().cast::<u8>();
        // SAFETY: 与 `copy_in` 相同的两段边界；源区间由调用方保证已写入。
        unsafe {
            ptr::copy_nonoverlapping(self.bytes().add(start), dst, first);
            ptr::copy_nonoverlapping(self.bytes(), dst.add(first), fold);
        }
    }

    /// 单元素写入：只触及一个槽位，不拆段。
    ///
    /// # Safety
    /// 容量非零，且该槽位不被对端读取。
    pub(crate) unsafe fn write_slot(self, value: T, cursor: usize) {
        let slot = self.capacity.slot(cursor).get();
        // SAFETY: 掩码保证 `slot < capacity`，调用方保证容量非零且该槽位无人读取。
        unsafe { self.slots.add(slot).cast::<T>().write(value) };
        self.access().wrote(slot, 1);
    }

    /// 单元素读取。
    ///
    /// # Safety
    /// 容量非零，且该槽位此前已写入。
    pub(crate) unsafe fn read_slot(self, cursor: usize) -> T {
        let slot = self.capacity.slot(cursor).get();
        self.access().read(slot, 1);
        // SAFETY: 掩码保证 `slot < capacity`，调用方保证该槽位此前已写入。
        unsafe { self.slots.add(slot).read().assume_init() }
    }
}
