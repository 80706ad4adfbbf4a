//! 双线程生产者/消费者示例。
//!
//! 用法：`fifo_spsc_demo [config.toml]`。未配置头宽时逐字节传输一段循环文本，
//! 配置了头宽时把每一行作为一条记录传输。两端都不阻塞，队列满/空时让出时间片。

use std::{env, path::PathBuf, thread};

use anyhow::{Context, ensure};
use spark_fifo::{DynamicFifo, DynamicRecordFifo};
use spark_fifo_demos::{DemoConfig, init_tracing};
use tracing::{debug, info};

const TEXT: &[u8; 16] = b"light-fifo test\n";

fn main() -> anyhow::Result<()> {
    init_tracing();
    let path = env::args_os().nth(1).map(PathBuf::from);
    let config = DemoConfig::load(path.as_deref())?;
    info!(
        capacity = config.fifo.capacity,
        header_width = ?config.fifo.header_width,
        messages = config.messages,
        "starting spsc demo"
    );

    match config.fifo.header_width()? {
        Some(_) => run_records(&config),
        None => run_bytes(&config),
    }
}

/// 逐字节传输 `messages` 个字节，消费者校验内容与顺序。
fn run_bytes(config: &DemoConfig) -> anyhow::Result<()> {
    let mut fifo = DynamicFifo::<u8>::from_config(&config.fifo).context("分配示例队列失败")?;
    let (mut producer, mut consumer) = fifo.split();
    let total = config.messages;

    let (received, mismatch) = thread::scope(|scope| {
        scope.spawn(move || {
            let mut sent = 0;
            while sent < total {
                if producer.put(TEXT[sent % TEXT.len()]) {
                    sent += 1;
                } else {
                    thread::yield_now();
                }
            }
            debug!(sent, "producer finished");
        });

        let mut received = 0;
        let mut mismatch = None;
        let mut line = Vec::with_capacity(TEXT.len());
        while received < total {
            let Some(byte) = consumer.get() else {
                thread::yield_now();
                continue;
            };
            if byte != TEXT[received % TEXT.len()] {
                // 继续排空队列，避免生产者在满队列上空转。
                mismatch.get_or_insert(received);
            }
            received += 1;
            line.push(byte);
            if byte == b'\n' {
                info!(line = %String::from_utf8_lossy(&line).trim_end(), "received");
                line.clear();
            }
        }
        (received, mismatch)
    });

    if let Some(at) = mismatch {
        anyhow::bail!("第 {at} 个字节乱序");
    }
    info!(received, "byte stream complete");
    Ok(())
}

/// 把文本的每一行作为一条记录传输。
fn run_records(config: &DemoConfig) -> anyhow::Result<()> {
    let mut fifo = DynamicRecordFifo::from_config(&config.fifo).context("分配示例队列失败")?;
    let record_len = TEXT.len() - 1;
    ensure!(
        fifo.max_record_len() >= record_len,
        "容量 {} 无法容纳长度 {record_len} 的记录",
        fifo.capacity()
    );
    let (mut producer, mut consumer) = fifo.split();
    let total = config.messages;

    let (delivered, corrupted) = thread::scope(|scope| {
        scope.spawn(move || {
            for _ in 0..total {
                while producer.push_record(&TEXT[..record_len]) == 0 {
                    thread::yield_now();
                }
            }
            debug!(sent = total, "record producer finished");
        });

        let mut out = [0u8; TEXT.len()];
        let mut delivered = 0;
        let mut corrupted = None;
        while delivered < total {
            match consumer.pop_record(&mut out) {
                0 => thread::yield_now(),
                len => {
                    if out[..len] != TEXT[..record_len] {
                        corrupted.get_or_insert(delivered);
                    }
                    delivered += 1;
                }
            }
        }
        (delivered, corrupted)
    });

    if let Some(at) = corrupted {
        anyhow::bail!("第 {at} 条记录内容错误");
    }
    info!(delivered, "record stream complete");
    Ok(())
}
