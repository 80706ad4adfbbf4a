use core::{fmt, marker::PhantomData, mem};

use crate::{
    copy::Region,
    error::Result,
    state::Cursors,
    storage::{HeapStorage, InlineStorage, Storage},
    sync::{AtomicUsize, Ordering},
    units::Capacity,
};

/// 环形 FIFO：写游标、读游标与一块槽位存储。
///
/// # 设计动机（Why）
/// - 以 2 的幂容量把取模退化为按位与，游标自由递增，`head - tail` 在回绕后依旧正确；
/// - 元素以 `T: Copy` 约束，出队只需按字节搬运，不涉及析构；
/// - 同一类型既可独占使用（本类型上的 `&mut self` 方法），也可经 [`Fifo::split`]
///   拆成跨线程的单生产者/单消费者两半。
///
/// # 契约说明（What）
/// - 任何时刻 `0 <= occupied() <= capacity()`；
/// - 批量操作返回实际搬运的元素数，可能小于请求值，短传输是背压信号而非错误；
/// - 单元素 `put`/`get` 以 `bool`/`Option` 报告满/空，不拆段、不分配。
///
/// # 形态
/// - [`StaticFifo<T, N>`]：编译期容量，内联存储；
/// - [`DynamicFifo<T>`]：运行期容量，堆存储，释放后退化为零容量队列。
pub struct Fifo<T, S> {
    head: AtomicUsize,
    tail: AtomicUsize,
    storage: S,
    _marker: PhantomData<T>,
}

/// 编译期容量 `N` 的内联 FIFO。
pub type StaticFifo<T, const N: usize> = Fifo<T, InlineStorage<T, N>>;

/// 运行期容量的堆分配 FIFO。
pub type DynamicFifo<T> = Fifo<T, HeapStorage<T>>;

impl<T: Copy, const N: usize> StaticFifo<T, N> {
    /// 创建空队列；`N` 在编译期校验为不小于 2 的 2 的幂。
    pub fn new() -> Self {
        Self::with_storage(InlineStorage::new())
    }
}

impl<T: Copy, const N: usize> Default for StaticFifo<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> DynamicFifo<T> {
    /// 分配容量不小于 `requested` 的队列（向上取整到 2 的幂）。
    ///
    /// - 取整后小于 2 或元素为零大小类型 → 非法配置；
    /// - 分配失败 → [`FifoError::OutOfMemory`](crate::FifoError::OutOfMemory)，不会重试。
    pub fn allocate(requested: usize) -> Result<Self> {
        Ok(Self::with_storage(HeapStorage::allocate(requested)?))
    }

    /// 释放旧存储后按新容量重新分配。
    ///
    /// 失败时队列保持释放后的零容量状态，仍可安全调用任何操作。
    pub fn reallocate(&mut self, requested: usize) -> Result<()> {
        self.free();
        self.storage = HeapStorage::allocate(requested)?;
        Ok(())
    }

    /// 归还存储并清零游标，之后队列表现为空的零容量队列；重复调用无副作用。
    pub fn free(&mut self) {
        self.storage.release();
        self.reset();
    }

    /// 存储是否已释放。
    pub fn is_released(&self) -> bool {
        self.storage.is_released()
    }
}

impl<T: Copy, S: Storage<T>> Fifo<T, S> {
    pub(crate) fn with_storage(storage: S) -> Self {
        Self {
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            storage,
            _marker: PhantomData,
        }
    }

    pub(crate) fn region(&self) -> Region<T> {
        Region::of(&self.storage)
    }

    pub(crate) fn capacity_units(&self) -> Capacity {
        Capacity::trusted(self.storage.capacity())
    }

    pub(crate) fn head_cursor(&self) -> &AtomicUsize {
        &self.head
    }

    pub(crate) fn tail_cursor(&self) -> &AtomicUsize {
        &self.tail
    }

    /// 独占访问下的游标快照；借用规则已排除并发，`Relaxed` 即可。
    pub(crate) fn cursors(&self) -> Cursors {
        Cursors::new(
            self.head.load(Ordering::Relaxed),
            self.tail.load(Ordering::Relaxed),
        )
    }

    pub(crate) fn advance_head(&mut self, from: usize, count: usize) {
        self.head.store(from.wrapping_add(count), Ordering::Relaxed);
    }

    pub(crate) fn advance_tail(&mut self, from: usize, count: usize) {
        self.tail.store(from.wrapping_add(count), Ordering::Relaxed);
    }

    /// 槽位总数；释放后的动态队列为 0。
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// 单个元素的字节数。
    pub fn element_size(&self) -> usize {
        mem::size_of::<T>()
    }

    /// 已排队的元素数。
    pub fn occupied(&self) -> usize {
        self.cursors().occupied()
    }

    /// 与 [`Fifo::occupied`] 相同，便于按集合习惯调用。
    pub fn len(&self) -> usize {
        self.occupied()
    }

    /// 尚可写入的元素数。
    pub fn free_space(&self) -> usize {
        self.cursors().free_space(self.capacity_units())
    }

    pub fn is_empty(&self) -> bool {
        self.cursors().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cursors().is_full(self.capacity_units())
    }

    /// 清零两个游标，丢弃全部内容；容量与存储保持不变。
    pub fn reset(&mut self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
    }

    /// 入队单个元素，队列已满时返回 `false`。
    pub fn put(&mut self, value: T) -> bool {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问；已满时不触碰存储。
        if !unsafe { self.write_one(value, at) } {
            return false;
        }
        self.advance_head(at.head, 1);
        true
    }

    /// 出队单个元素，队列为空时返回 `None`。
    pub fn get(&mut self) -> Option<T> {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问，`tail` 之后的槽位均已写入。
        let value = unsafe { self.read_one(at) }?;
        self.advance_tail(at.tail, 1);
        Some(value)
    }

    /// 查看队首元素但不移除。
    pub fn peek(&self) -> Option<T> {
        // SAFETY: 写入只能经由 `&mut self` 或已结束借用的生产者，共享借用期间无人写入。
        unsafe { self.read_one(self.cursors()) }
    }

    /// 批量入队，返回实际写入的元素数（`min(src.len(), free_space())`）。
    pub fn push_slice(&mut self, src: &[T]) -> usize {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问，写入量不超过空闲槽位数。
        let written = unsafe { self.write_flat(src, at) };
        self.advance_head(at.head, written);
        written
    }

    /// 批量出队，返回实际读出的元素数（`min(dst.len(), occupied())`）。
    pub fn pop_slice(&mut self, dst: &mut [T]) -> usize {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问，读取量不超过已写入的槽位数。
        let read = unsafe { self.read_flat(dst, at) };
        self.advance_tail(at.tail, read);
        read
    }

    /// 与 [`Fifo::pop_slice`] 相同，但不推进读游标。
    pub fn peek_slice(&self, dst: &mut [T]) -> usize {
        // SAFETY: 同 `peek`，共享借用期间无人写入。
        unsafe { self.read_flat(dst, self.cursors()) }
    }

    /// 丢弃至多 `count` 个队首元素，返回实际丢弃数。
    pub fn skip(&mut self, count: usize) -> usize {
        let at = self.cursors();
        let skipped = count.min(at.occupied());
        self.advance_tail(at.tail, skipped);
        skipped
    }

    // ---- 以下原语只搬运数据，不推进游标；独占 API 与拆分后的两半共用 ----

    /// # Safety
    /// 调用方持有生产者角色，`at` 是本角色视角下的最新快照。
    pub(crate) unsafe fn write_one(&self, value: T, at: Cursors) -> bool {
        if at.is_full(self.capacity_units()) {
            return false;
        }
        // SAFETY: 未满说明容量非零，且 `head` 处的槽位不在已占用区间内。
        unsafe { self.region().write_slot(value, at.head) };
        true
    }

    /// # Safety
    /// 调用方持有消费者角色，`at` 是本角色视角下的最新快照。
    pub(crate) unsafe fn read_one(&self, at: Cursors) -> Option<T> {
        if at.is_empty() {
            return None;
        }
        // SAFETY: 非空说明容量非零，且 `tail` 处的槽位已写入。
        Some(unsafe { self.region().read_slot(at.tail) })
    }

    /// # Safety
    /// 同 [`Fifo::write_one`]。
    pub(crate) unsafe fn write_flat(&self, src: &[T], at: Cursors) -> usize {
        let count = src.len().min(at.free_space(self.capacity_units()));
        // SAFETY: `count` 不超过空闲槽位数，目标区间不与已占用区间重叠。
        unsafe { self.region().copy_in(&src[..count], at.head) };
        count
    }

    /// # Safety
    /// 同 [`Fifo::read_one`]。
    pub(crate) unsafe fn read_flat(&self, dst: &mut [T], at: Cursors) -> usize {
        let count = dst.len().min(at.occupied());
        // SAFETY: `count` 不超过已占用槽位数，源区间均已写入。
        unsafe { self.region().copy_out(&mut dst[..count], at.tail) };
        count
    }
}

impl<T: Copy, S: Storage<T>> fmt::Debug for Fifo<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.cursors();
        f.debug_struct("Fifo")
            .field("capacity", &self.capacity())
            .field("element_size", &self.element_size())
            .field("head", &at.head)
            .field("tail", &at.tail)
            .finish()
    }
}

// SAFETY: 共享引用只能观察游标或在无写者时读取存储；写入必须经由 `&mut self`
// 或拆分后的唯一 `Producer`，读出同理经由唯一 `Consumer`，两者的区间由游标协议隔离。
unsafe impl<T: Send, S: Storage<T> + Send> Sync for Fifo<T, S> {}
