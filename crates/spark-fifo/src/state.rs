//! 游标快照与占用/空闲计数。

use crate::units::Capacity;

/// 某一时刻的写游标（`head`）与读游标（`tail`）。
///
/// # 教案式说明
/// - **意图 (Why)**：游标自由递增、只在索引时取模，使 `head - tail` 在 `usize` 回绕后依旧等于元素个数；
/// - **契约 (What)**：`0 <= head - tail <= capacity`（回绕减法意义下）在每个公开操作前后成立；
/// - **执行 (How)**：所有计数都是纯函数，既服务独占 API，也服务拆分后的生产者/消费者，
///   后者只是在取快照时使用不同的内存序。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cursors {
    pub(crate) head: usize,
    pub(crate) tail: usize,
}

impl Cursors {
    pub(crate) const fn new(head: usize, tail: usize) -> Self {
        Self { head, tail }
    }

    /// 已排队的元素数。
    pub(crate) const fn occupied(self) -> usize {
        self.head.wrapping_sub(self.tail)
    }

    /// 尚可写入的元素数。
    pub(crate) const fn free_space(self, capacity: Capacity) -> usize {
        capacity.get() - self.occupied()
    }

    pub(crate) const fn is_empty(self) -> bool {
        self.head == self.tail
    }

    pub(crate) const fn is_full(self, capacity: Capacity) -> bool {
        self.occupied() == capacity.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupied_survives_cursor_overflow() {
        let capacity = Capacity::trusted(16);
        let cursors = Cursors::new(3, usize::MAX - 4);
        assert_eq!(cursors.occupied(), 8);
        assert_eq!(cursors.free_space(capacity), 8);
        assert!(!cursors.is_empty());
        assert!(!cursors.is_full(capacity));
    }

    #[test]
    fn released_capacity_is_both_empty_and_full() {
        let cursors = Cursors::new(0, 0);
        assert!(cursors.is_empty());
        assert!(cursors.is_full(Capacity::RELEASED));
        assert_eq!(cursors.free_space(Capacity::RELEASED), 0);
    }
}
