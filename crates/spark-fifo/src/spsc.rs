//! 单生产者/单消费者拆分。
//!
//! # 内存序契约（What）
//! - 每一方只写自己的游标，读取自己的游标用 `Relaxed`，读取对端游标用 `Acquire`；
//! - 数据拷贝完成后才以 `Release` 发布自己的游标：
//!   - 生产者发布 `head` 时，消费者经由 `Acquire` 读到新 `head`，必然也看到此前写入的负载；
//!   - 消费者发布 `tail` 时，生产者经由 `Acquire` 读到新 `tail`，才会覆盖这些已读完的槽位。
//! - 任何操作都不阻塞、不重试；等待/退避策略由调用方决定。

use core::marker::PhantomData;

use crate::{
    fifo::Fifo,
    record::HeaderWidth,
    state::Cursors,
    storage::Storage,
    sync::Ordering,
};

impl<T: Copy, S: Storage<T>> Fifo<T, S> {
    /// 拆分为生产者与消费者两半。
    ///
    /// 两半共享同一个队列，借用期间队列本身不可再被访问；
    /// 两半均为 `Send`（当 `T: Send`），可分别交给两个线程，例如配合 `std::thread::scope`。
    pub fn split(&mut self) -> (Producer<'_, T, S>, Consumer<'_, T, S>) {
        let fifo: &Fifo<T, S> = self;
        (
            Producer {
                fifo,
                _not_sync: PhantomData,
            },
            Consumer {
                fifo,
                _not_sync: PhantomData,
            },
        )
    }

    /// 生产者视角：自己的 `head` 用 `Relaxed`，对端 `tail` 用 `Acquire`。
    fn producer_view(&self) -> Cursors {
        Cursors::new(
            self.head_cursor().load(Ordering::Relaxed),
            self.tail_cursor().load(Ordering::Acquire),
        )
    }

    /// 消费者视角：对端 `head` 用 `Acquire`，自己的 `tail` 用 `Relaxed`。
    fn consumer_view(&self) -> Cursors {
        Cursors::new(
            self.head_cursor().load(Ordering::Acquire),
            self.tail_cursor().load(Ordering::Relaxed),
        )
    }

    fn publish_head(&self, from: usize, count: usize) {
        if count > 0 {
            self.head_cursor()
                .store(from.wrapping_add(count), Ordering::Release);
        }
    }

    fn publish_tail(&self, from: usize, count: usize) {
        if count > 0 {
            self.tail_cursor()
                .store(from.wrapping_add(count), Ordering::Release);
        }
    }
}

/// 队列的写入一半，只推进 `head`。
pub struct Producer<'a, T, S> {
    fifo: &'a Fifo<T, S>,
    // 同一个生产者不能被两个线程共享引用后并发写入。
    _not_sync: PhantomData<core::cell::Cell<()>>,
}

impl<T: Copy, S: Storage<T>> Producer<'_, T, S> {
    /// 入队单个元素，队列已满时返回 `false`。
    pub fn put(&mut self, value: T) -> bool {
        let at = self.fifo.producer_view();
        // SAFETY: 本线程是唯一生产者，`at.head` 之后的空闲槽位不会被消费者读取。
        if !unsafe { self.fifo.write_one(value, at) } {
            return false;
        }
        self.fifo.publish_head(at.head, 1);
        true
    }

    /// 批量入队，返回实际写入的元素数。
    pub fn push_slice(&mut self, src: &[T]) -> usize {
        let at = self.fifo.producer_view();
        // SAFETY: 唯一生产者，只写入 `Acquire` 观察到的空闲区间。
        let written = unsafe { self.fifo.write_flat(src, at) };
        self.fifo.publish_head(at.head, written);
        written
    }

    pub fn free_space(&self) -> usize {
        self.fifo
            .producer_view()
            .free_space(self.fifo.capacity_units())
    }

    pub fn is_full(&self) -> bool {
        self.fifo.producer_view().is_full(self.fifo.capacity_units())
    }

    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }
}

impl<S: Storage<u8>> Producer<'_, u8, S> {
    /// 整条入队一条记录，被拒绝时返回 0。
    pub fn push_record(&mut self, src: &[u8], width: HeaderWidth) -> usize {
        let at = self.fifo.producer_view();
        // SAFETY: 唯一生产者，准入检查只使用 `Acquire` 观察到的空闲区间。
        match unsafe { self.fifo.write_record(src, width, at) } {
            Some(consumed) => {
                self.fifo.publish_head(at.head, consumed);
                src.len()
            }
            None => 0,
        }
    }
}

/// 队列的读取一半，只推进 `tail`。
pub struct Consumer<'a, T, S> {
    fifo: &'a Fifo<T, S>,
    _not_sync: PhantomData<core::cell::Cell<()>>,
}

impl<T: Copy, S: Storage<T>> Consumer<'_, T, S> {
    /// 出队单个元素，队列为空时返回 `None`。
    pub fn get(&mut self) -> Option<T> {
        let at = self.fifo.consumer_view();
        // SAFETY: `Acquire` 读到的 `head` 之前的槽位已由生产者完整写入。
        let value = unsafe { self.fifo.read_one(at) }?;
        self.fifo.publish_tail(at.tail, 1);
        Some(value)
    }

    /// 批量出队，返回实际读出的元素数。
    pub fn pop_slice(&mut self, dst: &mut [T]) -> usize {
        let at = self.fifo.consumer_view();
        // SAFETY: 唯一消费者，只读取 `Acquire` 观察到的已发布区间。
        let read = unsafe { self.fifo.read_flat(dst, at) };
        self.fifo.publish_tail(at.tail, read);
        read
    }

    /// 批量窥视，不推进 `tail`。
    pub fn peek_slice(&self, dst: &mut [T]) -> usize {
        // SAFETY: 唯一消费者，只读取已发布区间，且不推进 `tail`。
        unsafe { self.fifo.read_flat(dst, self.fifo.consumer_view()) }
    }

    pub fn occupied(&self) -> usize {
        self.fifo.consumer_view().occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.consumer_view().is_empty()
    }
}

impl<S: Storage<u8>> Consumer<'_, u8, S> {
    /// 整条出队一条记录，返回拷入 `dst` 的字节数；没有记录时返回 0。
    pub fn pop_record(&mut self, dst: &mut [u8], width: HeaderWidth) -> usize {
        let at = self.fifo.consumer_view();
        // SAFETY: 唯一消费者，只读取 `Acquire` 观察到的已发布区间。
        match unsafe { self.fifo.read_record(dst, width, at) } {
            Some((copied, consumed)) => {
                self.fifo.publish_tail(at.tail, consumed);
                copied
            }
            None => 0,
        }
    }

    /// 窥视下一条记录，不推进 `tail`。
    pub fn peek_record(&self, dst: &mut [u8], width: HeaderWidth) -> usize {
        // SAFETY: 唯一消费者，只读取已发布区间，且不推进 `tail`。
        unsafe { self.fifo.read_record(dst, width, self.fifo.consumer_view()) }
            .map_or(0, |(copied, _)| copied)
    }
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;
    use crate::fifo::StaticFifo;

    #[test]
    fn halves_share_one_ring() {
        let mut fifo = StaticFifo::<u32, 4>::new();
        let (mut producer, mut consumer) = fifo.split();
        assert_eq!(producer.push_slice(&[1, 2, 3, 4, 5]), 4);
        assert!(producer.is_full());
        assert_eq!(consumer.get(), Some(1));
        assert_eq!(producer.free_space(), 1);
        assert!(producer.put(5));
        let mut out = [0u32; 8];
        assert_eq!(consumer.pop_slice(&mut out), 4);
        assert_eq!(&out[..4], &[2, 3, 4, 5]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn halves_are_send() {
        fn assert_send<V: Send>() {}
        assert_send::<Producer<'static, u64, crate::InlineStorage<u64, 8>>>();
        assert_send::<Consumer<'static, u8, crate::HeapStorage<u8>>>();
    }
}
