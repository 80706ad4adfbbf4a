//! 以 `VecDeque` 为影子模型的性质测试。
//!
//! # 覆盖的性质（What）
//! - 任意操作序列之后 `occupied + free_space == capacity`，且出队内容与模型逐元素一致；
//! - 任意头宽与长度组合下，记录写入后按原样读出，拒绝时队列保持不变。
#![cfg(not(any(loom, spark_loom)))]

use std::collections::VecDeque;

use proptest::prelude::*;
use spark_fifo::{HeaderWidth, RecordFifo, StaticFifo};

#[derive(Clone, Debug)]
enum Op {
    Put(u32),
    Get,
    Push(Vec<u32>),
    Pop(usize),
    Peek(usize),
    Skip(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u32>().prop_map(Op::Put),
        Just(Op::Get),
        prop::collection::vec(any::<u32>(), 0..24).prop_map(Op::Push),
        (0usize..24).prop_map(Op::Pop),
        (0usize..24).prop_map(Op::Peek),
        (0usize..24).prop_map(Op::Skip),
    ]
}

proptest! {
    #[test]
    fn flat_operations_match_the_model(ops in prop::collection::vec(op(), 1..200)) {
        let mut fifo = StaticFifo::<u32, 16>::new();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::Put(value) => {
                    let accepted = fifo.put(value);
                    prop_assert_eq!(accepted, model.len() < 16);
                    if accepted {
                        model.push_back(value);
                    }
                }
                Op::Get => prop_assert_eq!(fifo.get(), model.pop_front()),
                Op::Push(values) => {
                    let written = fifo.push_slice(&values);
                    prop_assert_eq!(written, values.len().min(16 - model.len()));
                    model.extend(&values[..written]);
                }
                Op::Pop(len) => {
                    let mut out = vec![0u32; len];
                    let read = fifo.pop_slice(&mut out);
                    let expected: Vec<u32> = model.drain(..len.min(model.len())).collect();
                    prop_assert_eq!(&out[..read], expected.as_slice());
                }
                Op::Peek(len) => {
                    let mut out = vec![0u32; len];
                    let read = fifo.peek_slice(&mut out);
                    let expected: Vec<u32> = model.iter().take(len).copied().collect();
                    prop_assert_eq!(&out[..read], expected.as_slice());
                }
                Op::Skip(count) => {
                    let skipped = fifo.skip(count);
                    prop_assert_eq!(skipped, count.min(model.len()));
                    model.drain(..skipped).for_each(drop);
                }
            }
            prop_assert_eq!(fifo.occupied(), model.len());
            prop_assert_eq!(fifo.occupied() + fifo.free_space(), fifo.capacity());
        }
    }

    #[test]
    fn records_round_trip_for_every_header_width(
        bytes in 1usize..=8,
        offset in 0usize..256,
        records in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..90), 1..12),
    ) {
        let width = HeaderWidth::new(bytes).expect("范围内的头宽");
        // 预先错开游标，让头部与负载落在任意折回位置。
        let mut plain = StaticFifo::<u8, 256>::new();
        plain.push_slice(&vec![0u8; offset]);
        plain.skip(offset);
        let mut fifo = RecordFifo::from_fifo(plain, width);

        let mut model: VecDeque<Vec<u8>> = VecDeque::new();
        for record in &records {
            let before = fifo.occupied();
            let fits = !record.is_empty()
                && (record.len() as u64) <= width.max_len()
                && record.len() + bytes <= fifo.free_space();
            let accepted = fifo.push_record(record);
            if fits {
                prop_assert_eq!(accepted, record.len());
                model.push_back(record.clone());
            } else {
                prop_assert_eq!(accepted, 0);
                prop_assert_eq!(fifo.occupied(), before);
            }
        }

        let mut out = [0u8; 256];
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(fifo.next_record_len(), Some(expected.len()));
            let len = fifo.pop_record(&mut out);
            prop_assert_eq!(&out[..len], expected.as_slice());
        }
        prop_assert!(fifo.is_empty());
    }
}
