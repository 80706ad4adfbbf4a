#![cfg(not(any(loom, spark_loom)))]
//! 拆分后的生产者/消费者在真实线程上的行为。

use std::thread;

use spark_fifo::{DynamicFifo, DynamicRecordFifo, HeaderWidth, StaticFifo};

const TOTAL: u64 = 100_000;

#[test]
fn elements_arrive_in_order_across_threads() {
    let mut fifo = StaticFifo::<u64, 64>::new();
    let (mut producer, mut consumer) = fifo.split();

    thread::scope(|scope| {
        scope.spawn(move || {
            let mut next = 0;
            while next < TOTAL {
                if producer.put(next) {
                    next += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        while expected < TOTAL {
            match consumer.get() {
                Some(value) => {
                    assert_eq!(value, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }
    });
}

#[test]
fn batches_straddle_the_wrap_under_contention() {
    let mut fifo = DynamicFifo::<u32>::allocate(100).expect("分配应成功");
    let (mut producer, mut consumer) = fifo.split();
    let input: Vec<u32> = (0..50_000).collect();

    thread::scope(|scope| {
        let input = &input;
        scope.spawn(move || {
            let mut sent = 0;
            while sent < input.len() {
                let end = (sent + 37).min(input.len());
                sent += producer.push_slice(&input[sent..end]);
                if producer.is_full() {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::with_capacity(input.len());
        let mut chunk = [0u32; 29];
        while received.len() < input.len() {
            let read = consumer.pop_slice(&mut chunk);
            if read == 0 {
                thread::yield_now();
            }
            received.extend_from_slice(&chunk[..read]);
        }
        assert_eq!(&received, input);
    });
}

#[test]
fn records_are_never_observed_half_written() {
    let width = HeaderWidth::new(2).expect("合法宽度");
    let mut fifo = DynamicRecordFifo::allocate(256, width).expect("分配应成功");
    let (mut producer, mut consumer) = fifo.split();

    thread::scope(|scope| {
        scope.spawn(move || {
            for round in 0..5_000usize {
                let len = round % 120 + 1;
                let record = vec![(round % 251) as u8; len];
                while producer.push_record(&record) == 0 {
                    thread::yield_now();
                }
            }
        });

        let mut out = [0u8; 128];
        for round in 0..5_000usize {
            let len = loop {
                match consumer.pop_record(&mut out) {
                    0 => thread::yield_now(),
                    len => break len,
                }
            };
            assert_eq!(len, round % 120 + 1);
            assert!(out[..len].iter().all(|&byte| byte == (round % 251) as u8));
        }
        assert!(consumer.is_empty());
    });
}

#[test]
fn multiple_producers_serialise_through_a_lock() {
    let mut fifo = StaticFifo::<u32, 32>::new();
    let (producer, mut consumer) = fifo.split();
    let producer = spin::Mutex::new(producer);

    thread::scope(|scope| {
        for id in 0..4u32 {
            let producer = &producer;
            scope.spawn(move || {
                for seq in 0..1_000u32 {
                    let value = id << 16 | seq;
                    while !producer.lock().put(value) {
                        thread::yield_now();
                    }
                }
            });
        }

        let mut last = [None::<u32>; 4];
        let mut seen = 0;
        while seen < 4_000 {
            let Some(value) = consumer.get() else {
                thread::yield_now();
                continue;
            };
            let (id, seq) = ((value >> 16) as usize, value & 0xffff);
            // 同一生产者的元素保持各自的提交顺序。
            assert!(last[id].is_none_or(|prev| prev < seq));
            last[id] = Some(seq);
            seen += 1;
        }
    });
}
