//! 记录帧：每个单元由定宽长度头与负载组成，整体入队、整体出队。
//!
//! # 线格式（What）
//! - `[len: header_width 字节, 小端][payload: len 字节]`，头与负载都经由平铺拷贝引擎写入，
//!   因而跨越存储区末尾时同样正确折回；
//! - 编码以写游标为基准，解码以读游标为基准，两者互为逆运算；
//! - 头宽在 1..=8 字节之间，负载长度必须能被头宽表示。
//! - 记录模式只对字节队列开放（`impl Fifo<u8, S>`），元素为其它类型的队列只有平铺接口。
//!
//! # 准入规则（How）
//! - `len + header_width > free_space()`、`len == 0` 或长度超出头宽可表示范围时整体拒绝，返回 0，
//!   不会写入任何半截记录；
//! - 出队时按头部声明的完整长度推进读游标，调用方缓冲较小时多出的负载被丢弃。

use crate::{
    config::FifoConfig,
    error::{FifoError, Result},
    fifo::Fifo,
    spsc::{Consumer, Producer},
    state::Cursors,
    storage::{HeapStorage, InlineStorage, Storage},
};

/// 记录长度头的字节宽度，取值 1..=8。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderWidth(u8);

impl HeaderWidth {
    /// 未显式配置时使用的头宽。
    pub const DEFAULT: HeaderWidth = HeaderWidth(1);
    pub const MAX: usize = 8;

    pub fn new(width: usize) -> Result<Self> {
        match u8::try_from(width) {
            Ok(bytes @ 1..=8) => Ok(Self(bytes)),
            _ => Err(FifoError::InvalidHeaderWidth { width }),
        }
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// 该宽度能表示的最大负载长度。
    pub const fn max_len(self) -> u64 {
        if self.0 as usize == Self::MAX {
            u64::MAX
        } else {
            (1u64 << (8 * self.0 as u32)) - 1
        }
    }

    fn fits(self, len: usize) -> bool {
        u64::try_from(len).is_ok_and(|len| len <= self.max_len())
    }

    fn encode(self, len: usize) -> [u8; Self::MAX] {
        (len as u64).to_le_bytes()
    }

    fn decode(self, raw: [u8; Self::MAX]) -> u64 {
        u64::from_le_bytes(raw)
    }
}

impl Default for HeaderWidth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl<S: Storage<u8>> Fifo<u8, S> {
    /// 入队一条记录，成功返回负载长度，被拒绝返回 0。
    pub fn push_record(&mut self, src: &[u8], width: HeaderWidth) -> usize {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问。
        match unsafe { self.write_record(src, width, at) } {
            Some(consumed) => {
                self.advance_head(at.head, consumed);
                src.len()
            }
            None => 0,
        }
    }

    /// 出队一条完整记录，返回拷入 `dst` 的字节数；队列为空返回 0。
    pub fn pop_record(&mut self, dst: &mut [u8], width: HeaderWidth) -> usize {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问。
        match unsafe { self.read_record(dst, width, at) } {
            Some((copied, consumed)) => {
                self.advance_tail(at.tail, consumed);
                copied
            }
            None => 0,
        }
    }

    /// 与 [`Fifo::pop_record`] 相同，但不推进读游标。
    pub fn peek_record(&self, dst: &mut [u8], width: HeaderWidth) -> usize {
        // SAFETY: 共享借用期间无人写入。
        unsafe { self.read_record(dst, width, self.cursors()) }.map_or(0, |(copied, _)| copied)
    }

    /// 下一条记录声明的负载长度；队列为空或不足一个头时返回 `None`。
    pub fn next_record_len(&self, width: HeaderWidth) -> Option<usize> {
        // SAFETY: 共享借用期间无人写入。
        unsafe { self.stored_record_len(width, self.cursors()) }
    }

    /// 整条丢弃下一条记录，返回其负载长度。
    pub fn skip_record(&mut self, width: HeaderWidth) -> Option<usize> {
        let at = self.cursors();
        // SAFETY: `&mut self` 排除了并发访问。
        let len = unsafe { self.stored_record_len(width, at) }?;
        self.advance_tail(at.tail, len + width.get());
        Some(len)
    }

    /// 编码长度头并写入负载，返回需要推进的元素数；准入失败返回 `None`。
    ///
    /// # Safety
    /// 调用方持有生产者角色。
    pub(crate) unsafe fn write_record(
        &self,
        src: &[u8],
        width: HeaderWidth,
        at: Cursors,
    ) -> Option<usize> {
        let len = src.len();
        if len == 0 || !width.fits(len) {
            return None;
        }
        let framed = len.checked_add(width.get())?;
        if framed > at.free_space(self.capacity_units()) {
            return None;
        }
        let header = width.encode(len);
        let region = self.region();
        // SAFETY: 准入检查保证头与负载共 `framed` 个槽位都在空闲区间内。
        unsafe {
            region.copy_in(&header[..width.get()], at.head);
            region.copy_in(src, at.head.wrapping_add(width.get()));
        }
        Some(framed)
    }

    /// 解码长度头并拷出负载，返回 `(拷入字节数, 需要推进的元素数)`。
    ///
    /// # Safety
    /// 调用方持有消费者角色。
    pub(crate) unsafe fn read_record(
        &self,
        dst: &mut [u8],
        width: HeaderWidth,
        at: Cursors,
    ) -> Option<(usize, usize)> {
        // SAFETY: 调用方持有消费者角色。
        let stored = unsafe { self.stored_record_len(width, at) }?;
        let copied = dst.len().min(stored);
        // SAFETY: `stored` 已截断到头部之后实际驻留的字节数。
        unsafe {
            self.region()
                .copy_out(&mut dst[..copied], at.tail.wrapping_add(width.get()));
        }
        Some((copied, stored + width.get()))
    }

    /// 读取读游标处的长度头。
    ///
    /// 准入检查保证正常写入的记录不会越界；若以平铺方式混写了字节，
    /// 解出的长度会被截断到实际驻留的字节数，从而保证拷贝永远落在已写区间内。
    ///
    /// # Safety
    /// 调用方持有消费者角色。
    unsafe fn stored_record_len(&self, width: HeaderWidth, at: Cursors) -> Option<usize> {
        // 空队列与不足一个头的残片都视为没有可读记录。
        let occupied = at.occupied();
        if occupied < width.get() {
            return None;
        }
        let mut raw = [0u8; HeaderWidth::MAX];
        // SAFETY: 已占用字节数不小于头宽，头部区间均已写入。
        unsafe { self.region().copy_out(&mut raw[..width.get()], at.tail) };
        let declared = width.decode(raw);
        let resident = occupied - width.get();
        Some(usize::try_from(declared).map_or(resident, |len| len.min(resident)))
    }
}

/// 头宽固定的记录队列。
///
/// # 教案式说明
/// - **意图 (Why)**：头宽属于队列实例的不变量，固定在构造期可避免读写两端传入不同宽度；
/// - **契约 (What)**：除构造外的全部操作都委派给内部 [`Fifo<u8, S>`]，语义与按次传宽度的版本一致；
///   记录模式只存在于字节队列：`push_record` 等方法仅定义在 `Fifo<u8, S>` 上，`Fifo<u64, S>` 等元素队列没有记录模式；
/// - **风险 (Trade-offs)**：[`RecordFifo::as_fifo`] 只暴露只读视图，混写平铺字节需要先 `into_inner`。
///
/// ```compile_fail
/// use spark_fifo::{HeaderWidth, StaticFifo};
///
/// let mut words = StaticFifo::<u64, 8>::new();
/// words.push_record(&[1, 2, 3], HeaderWidth::DEFAULT);
/// ```
pub struct RecordFifo<S> {
    fifo: Fifo<u8, S>,
    width: HeaderWidth,
}

/// 编译期容量的内联记录队列。
pub type StaticRecordFifo<const N: usize> = RecordFifo<InlineStorage<u8, N>>;

/// 运行期容量的堆分配记录队列。
pub type DynamicRecordFifo = RecordFifo<HeapStorage<u8>>;

impl<const N: usize> StaticRecordFifo<N> {
    pub fn new(width: HeaderWidth) -> Self {
        Self::from_fifo(Fifo::new(), width)
    }
}

impl DynamicRecordFifo {
    pub fn allocate(requested: usize, width: HeaderWidth) -> Result<Self> {
        Ok(Self::from_fifo(Fifo::allocate(requested)?, width))
    }

    /// 按配置分配；未配置头宽时使用 [`HeaderWidth::DEFAULT`]。
    pub fn from_config(config: &FifoConfig) -> Result<Self> {
        let width = config.header_width()?.unwrap_or_default();
        Self::allocate(config.capacity, width)
    }

    /// 归还存储，之后表现为零容量队列。
    pub fn free(&mut self) {
        self.fifo.free();
    }
}

impl<S: Storage<u8>> RecordFifo<S> {
    pub fn from_fifo(fifo: Fifo<u8, S>, width: HeaderWidth) -> Self {
        Self { fifo, width }
    }

    pub fn header_width(&self) -> HeaderWidth {
        self.width
    }

    /// 空队列一次能接纳的最大负载长度。
    pub fn max_record_len(&self) -> usize {
        let by_capacity = self.fifo.capacity().saturating_sub(self.width.get());
        usize::try_from(self.width.max_len()).map_or(by_capacity, |max| max.min(by_capacity))
    }

    pub fn push_record(&mut self, src: &[u8]) -> usize {
        self.fifo.push_record(src, self.width)
    }

    pub fn pop_record(&mut self, dst: &mut [u8]) -> usize {
        self.fifo.pop_record(dst, self.width)
    }

    pub fn peek_record(&self, dst: &mut [u8]) -> usize {
        self.fifo.peek_record(dst, self.width)
    }

    pub fn next_record_len(&self) -> Option<usize> {
        self.fifo.next_record_len(self.width)
    }

    pub fn skip_record(&mut self) -> Option<usize> {
        self.fifo.skip_record(self.width)
    }

    /// 占用字节数，包含长度头。
    pub fn occupied(&self) -> usize {
        self.fifo.occupied()
    }

    pub fn free_space(&self) -> usize {
        self.fifo.free_space()
    }

    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }

    pub fn reset(&mut self) {
        self.fifo.reset();
    }

    pub fn as_fifo(&self) -> &Fifo<u8, S> {
        &self.fifo
    }

    pub fn into_inner(self) -> Fifo<u8, S> {
        self.fifo
    }

    /// 拆分为携带固定头宽的记录生产者/消费者。
    pub fn split(&mut self) -> (RecordProducer<'_, S>, RecordConsumer<'_, S>) {
        let width = self.width;
        let (producer, consumer) = self.fifo.split();
        (
            RecordProducer {
                inner: producer,
                width,
            },
            RecordConsumer {
                inner: consumer,
                width,
            },
        )
    }
}

/// [`RecordFifo`] 的生产者一半。
pub struct RecordProducer<'a, S: Storage<u8>> {
    inner: Producer<'a, u8, S>,
    width: HeaderWidth,
}

impl<S: Storage<u8>> RecordProducer<'_, S> {
    pub fn push_record(&mut self, src: &[u8]) -> usize {
        self.inner.push_record(src, self.width)
    }

    pub fn free_space(&self) -> usize {
        self.inner.free_space()
    }
}

/// [`RecordFifo`] 的消费者一半。
pub struct RecordConsumer<'a, S: Storage<u8>> {
    inner: Consumer<'a, u8, S>,
    width: HeaderWidth,
}

impl<S: Storage<u8>> RecordConsumer<'_, S> {
    pub fn pop_record(&mut self, dst: &mut [u8]) -> usize {
        self.inner.pop_record(dst, self.width)
    }

    pub fn peek_record(&self, dst: &mut [u8]) -> usize {
        self.inner.peek_record(dst, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;
    use crate::fifo::StaticFifo;

    #[test]
    fn header_width_range_is_one_to_eight() {
        assert!(HeaderWidth::new(0).is_err());
        assert!(HeaderWidth::new(9).is_err());
        assert_eq!(HeaderWidth::new(8).map(HeaderWidth::get), Ok(8));
        assert_eq!(HeaderWidth::new(2).map(HeaderWidth::max_len), Ok(0xffff));
    }

    #[test]
    fn header_bytes_are_little_endian_at_the_write_cursor() {
        let width = HeaderWidth::new(2).expect("合法宽度");
        let mut fifo = StaticRecordFifo::<512>::new(width).into_inner();
        fifo.push_slice(&[0xaa; 3]);
        fifo.skip(3);
        let payload = [7u8; 0x0102];
        assert_eq!(fifo.push_record(&payload, width), 0x0102);
        let mut header = [0u8; 2];
        assert_eq!(fifo.peek_slice(&mut header), 2);
        assert_eq!(header, [0x02, 0x01]);
    }

    #[test]
    fn oversized_length_for_width_is_rejected() {
        let width = HeaderWidth::new(1).expect("合法宽度");
        let mut fifo = StaticRecordFifo::<512>::new(width);
        assert_eq!(fifo.push_record(&[1u8; 256]), 0);
        assert!(fifo.is_empty());
        assert_eq!(fifo.push_record(&[1u8; 255]), 255);
    }

    #[test]
    fn truncated_header_is_never_consumed() {
        let width = HeaderWidth::new(4).expect("合法宽度");
        let mut fifo = StaticFifo::<u8, 8>::new();
        fifo.push_slice(&[1, 0]);
        let mut out = [0u8; 8];
        assert_eq!(fifo.pop_record(&mut out, width), 0);
        assert_eq!(fifo.occupied(), 2);
    }
}
